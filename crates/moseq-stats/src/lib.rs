//! Numeric primitives for the MoSeq analysis tools.
//!
//! This crate provides the statistical building blocks shared by the changepoint
//! detector and the group statistics engine:
//!
//! - **Descriptive statistics**: mean, variance, sample standard deviation, extrema
//! - **Percentiles**: linearly interpolated percentiles of a dataset
//! - **Ranks**: average ranks with tie handling and tie-correction terms
//! - **Multiple-testing correction**: Bonferroni, Holm, Benjamini-Hochberg and friends
//! - **Distributions**: chi-square survival function
//! - **Kruskal-Wallis**: the reference (chi-square based) H test
//! - **Signal filters**: reflect-mode derivative, Gaussian and median filters, local maxima
//! - **Permutations**: seeded random permutations and cyclic shuffles
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Interpolated percentiles and evenly spaced grids
//! - [`rank`]: Ranking with ties
//! - [`correction`]: Multiple-testing correction of p-values
//! - [`distribution`]: Special functions and the chi-square distribution
//! - [`kruskal`]: Kruskal-Wallis H test
//! - [`signal`]: One-dimensional filters over time series
//! - [`permutation`]: Random permutations drawn from a caller-supplied generator
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use moseq_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Ranking with ties
//!
//! ```
//! use moseq_stats::rank;
//!
//! let ranks = rank::average_ranks(&[10.0, 20.0, 20.0, 30.0]);
//! assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
//! ```
//!
//! ## Correcting p-values
//!
//! ```
//! use moseq_stats::correction::CorrectionMethod;
//!
//! let adjusted = CorrectionMethod::FdrBh.adjust(&[0.01, 0.04, 0.03]);
//! assert!(adjusted.iter().all(|p| *p <= 0.04 + 1e-12));
//! ```
//!
//! ## Running a Kruskal-Wallis test
//!
//! ```
//! use moseq_stats::kruskal;
//!
//! let a = [1.0, 2.0, 3.0];
//! let b = [4.0, 5.0, 6.0];
//! let result = kruskal::kruskal_wallis(&[&a, &b]).unwrap();
//! assert!(result.pvalue < 0.1);
//! ```

pub mod correction;
pub mod descriptive;
pub mod distribution;
pub mod kruskal;
pub mod percentiles;
pub mod permutation;
pub mod rank;
pub mod signal;
