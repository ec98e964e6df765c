//! Behavioral syllable analysis for keypoint-MoSeq outputs
//!
//! This crate turns per-frame model outputs (keypoint coordinates, syllable
//! labels, centroid and heading) into changepoints, usage tables, group
//! comparisons and transition models.
//!
//! # Overview
//!
//! ## Changepoint Workflow
//!
//! Find frames where pose dynamics change abruptly:
//!
//! 1. **Load Trajectories** ([`trajectory::Trajectory`]): Keypoints per session, with a validity mask
//! 2. **Resolve Body Parts** ([`config::AnalysisConfig`]): Map anterior/posterior names to indices
//! 3. **Align** ([`alignment::align_egocentric`]): Center on the body and rotate the heading to `+x`
//! 4. **Detect** ([`changepoint::detect_changepoints`]): Threshold scan against a shuffled null
//!
//! ## Group Comparison Workflow
//!
//! Test which syllables are used differently across experimental groups:
//!
//! 1. **Frame Table** ([`usage::compute_moseq_df`]): Velocity, smoothed heading and onsets per frame
//! 2. **Usage Table** ([`usage::compute_stats_df`]): Frequency, duration and kinematics per syllable
//! 3. **Omnibus Test** ([`group_stats::kruskal_wallis_permutation`]): Permutation Kruskal-Wallis
//! 4. **Post-hoc Tests** ([`group_stats::dunn_test_pairs`], [`group_stats::correct_pairwise`]):
//!    Dunn's z per group pair with multiple-testing correction
//!
//! [`group_stats::run_kruskal`] runs steps 3-4 on a usage table.
//!
//! ## Reports
//!
//! - [`ordering`]: Syllable orderings by a statistic or a group difference
//! - [`transitions`]: Bigram transition matrices per session or per group
//!
//! # Randomness
//!
//! Functions that draw permutations take the generator as an argument
//! (`&mut R where R: Rng + ?Sized`). Nothing uses a global random state, so a
//! seeded generator makes every result reproducible.
//!
//! # Examples
//!
//! ## Comparing syllable usage between groups
//!
//! ```
//! use moseq_analysis::{
//!     group_stats::{KruskalParams, run_kruskal},
//!     trajectory::SessionMap,
//!     usage::{SessionResults, Statistic, StatsParams, compute_moseq_df, compute_stats_df},
//! };
//! use rand::SeedableRng as _;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let mut sessions = SessionMap::new();
//! for (name, group, labels) in [
//!     ("m1", "ctrl", vec![0, 0, 1, 1, 1, 1]),
//!     ("m2", "ctrl", vec![0, 1, 1, 1, 1, 1]),
//!     ("m3", "ko", vec![0, 0, 0, 0, 0, 1]),
//!     ("m4", "ko", vec![0, 0, 0, 0, 1, 1]),
//! ] {
//!     let n = labels.len();
//!     sessions.insert(
//!         name.to_owned(),
//!         SessionResults {
//!             group: group.to_owned(),
//!             syllables: labels.clone(),
//!             syllables_reindexed: labels,
//!             centroid: vec![[0.0, 0.0]; n],
//!             heading: vec![0.0; n],
//!         },
//!     );
//! }
//!
//! let frames = compute_moseq_df(&sessions, 30.0, true)?;
//! let stats = compute_stats_df(&frames, &StatsParams::default())?;
//!
//! let params = KruskalParams {
//!     n_permutations: 100,
//!     ..KruskalParams::default()
//! };
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(42);
//! let report = run_kruskal(&stats, Statistic::Frequency, &params, &mut rng)?;
//! assert_eq!(report.omnibus.len(), 2);
//! assert_eq!(report.pairs.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`trajectory`]: Keypoint trajectories and session maps
//! - [`config`]: Body-part configuration and analysis parameters
//! - [`alignment`]: Egocentric alignment
//! - [`changepoint`]: Changepoint detection
//! - [`usage`]: Frame and syllable usage tables
//! - [`group_stats`]: Permutation Kruskal-Wallis and Dunn's tests
//! - [`ordering`]: Syllable orderings
//! - [`transitions`]: Transition matrices

pub mod alignment;
pub mod changepoint;
pub mod config;
pub mod group_stats;
pub mod ordering;
pub mod trajectory;
pub mod transitions;
pub mod usage;
