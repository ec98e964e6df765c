//! Syllable usage tables
//!
//! Per-frame model outputs of each session are first flattened into a frame
//! table ([`compute_moseq_df`]), which adds centroid velocity, optionally
//! smoothed heading and syllable onset flags. The frame table is then
//! summarized per (group, session, syllable) by [`compute_stats_df`].
//!
//! # Statistics
//!
//! | column                | meaning                                            |
//! |-----------------------|----------------------------------------------------|
//! | `frequency`           | share (or count) of the session's retained frames  |
//! | `duration`            | mean length of the syllable's instances, seconds   |
//! | `heading_*`           | mean / std / min / max of heading                  |
//! | `velocity_px_s_*`     | mean / std / min / max of centroid speed           |
//!
//! Standard deviations are sample deviations (`ddof = 1`). Syllables that a
//! session never uses still get a row with `frequency = 0` and no duration or
//! kinematics.

use std::{collections::BTreeMap, str::FromStr};

use log::info;
use moseq_stats::{descriptive::DescriptiveStats, signal::median_filter1d};
use serde::{Deserialize, Serialize};

use crate::trajectory::SessionMap;

/// Window of the median filter used to smooth heading.
const HEADING_FILTER_SIZE: usize = 9;

fn default_group() -> String {
    "default".to_owned()
}

/// Model outputs of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResults {
    /// Experimental group; sessions without one are assigned to `"default"`
    #[serde(default = "default_group")]
    pub group: String,
    /// Raw syllable label of each frame
    pub syllables: Vec<u32>,
    /// Syllable label of each frame after reindexing by usage
    pub syllables_reindexed: Vec<u32>,
    /// Planar centroid of each frame
    pub centroid: Vec<[f64; 2]>,
    /// Heading of each frame in radians
    pub heading: Vec<f64>,
}

/// One row of the frame table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub group: String,
    pub session: String,
    pub frame_index: usize,
    pub centroid: [f64; 2],
    pub heading: f64,
    pub velocity_px_s: f64,
    pub syllable: u32,
    pub syllable_reindexed: u32,
    /// `true` on the first frame of every syllable instance
    pub onset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsParams {
    /// Syllables whose overall frame share is at most this value are dropped
    pub threshold: f64,
    pub fps: f64,
    /// Report frequencies as shares instead of frame counts
    pub normalize: bool,
}

impl Default for StatsParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            fps: 30.0,
            normalize: true,
        }
    }
}

/// Summary of one syllable within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllableStats {
    pub group: String,
    pub session: String,
    /// Reindexed syllable label
    pub syllable: u32,
    pub frequency: f64,
    pub duration: Option<f64>,
    pub heading_mean: Option<f64>,
    pub heading_std: Option<f64>,
    pub heading_min: Option<f64>,
    pub heading_max: Option<f64>,
    pub velocity_px_s_mean: Option<f64>,
    pub velocity_px_s_std: Option<f64>,
    pub velocity_px_s_min: Option<f64>,
    pub velocity_px_s_max: Option<f64>,
}

/// Numeric columns of [`SyllableStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Frequency,
    Duration,
    HeadingMean,
    HeadingStd,
    HeadingMin,
    HeadingMax,
    #[serde(rename = "velocity_px_s_mean")]
    VelocityMean,
    #[serde(rename = "velocity_px_s_std")]
    VelocityStd,
    #[serde(rename = "velocity_px_s_min")]
    VelocityMin,
    #[serde(rename = "velocity_px_s_max")]
    VelocityMax,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display(
    "unknown statistic '{name}' (expected one of: {})",
    Statistic::ALL.map(Statistic::name).join(", ")
)]
pub struct StatisticParseError {
    pub name: String,
}

impl Statistic {
    pub const ALL: [Self; 10] = [
        Self::Frequency,
        Self::Duration,
        Self::HeadingMean,
        Self::HeadingStd,
        Self::HeadingMin,
        Self::HeadingMax,
        Self::VelocityMean,
        Self::VelocityStd,
        Self::VelocityMin,
        Self::VelocityMax,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Duration => "duration",
            Self::HeadingMean => "heading_mean",
            Self::HeadingStd => "heading_std",
            Self::HeadingMin => "heading_min",
            Self::HeadingMax => "heading_max",
            Self::VelocityMean => "velocity_px_s_mean",
            Self::VelocityStd => "velocity_px_s_std",
            Self::VelocityMin => "velocity_px_s_min",
            Self::VelocityMax => "velocity_px_s_max",
        }
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = StatisticParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| StatisticParseError { name: s.to_owned() })
    }
}

impl SyllableStats {
    /// Value of `stat`, or `None` if the syllable was not used.
    #[must_use]
    pub fn get(&self, stat: Statistic) -> Option<f64> {
        match stat {
            Statistic::Frequency => Some(self.frequency),
            Statistic::Duration => self.duration,
            Statistic::HeadingMean => self.heading_mean,
            Statistic::HeadingStd => self.heading_std,
            Statistic::HeadingMin => self.heading_min,
            Statistic::HeadingMax => self.heading_max,
            Statistic::VelocityMean => self.velocity_px_s_mean,
            Statistic::VelocityStd => self.velocity_px_s_std,
            Statistic::VelocityMin => self.velocity_px_s_min,
            Statistic::VelocityMax => self.velocity_px_s_max,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum UsageError {
    #[display(
        "session '{session}': {field} has {found} entries but syllables has {expected}"
    )]
    LengthMismatch {
        session: String,
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[display("fps must be a positive number, got {fps}")]
    InvalidFps { fps: f64 },
}

/// Smooths a sequence of angles with a median filter on their sine and
/// cosine, so wrap-around at ±π does not produce spikes.
#[must_use]
pub fn filter_angle(angles: &[f64], size: usize) -> Vec<f64> {
    let (sin, cos): (Vec<_>, Vec<_>) = angles.iter().map(|a| a.sin_cos()).unzip();
    let sin = median_filter1d(&sin, size);
    let cos = median_filter1d(&cos, size);
    sin.iter().zip(&cos).map(|(s, c)| s.atan2(*c)).collect()
}

/// Builds the frame table of all sessions, in session-key order.
///
/// Velocity is the centroid displacement between consecutive frames times
/// `fps` (0 for the first frame of each session). Onsets are flagged where
/// the raw syllable label differs from the previous row of the table, so the
/// first frame of a session is an onset only if its label differs from the
/// last frame of the previous session.
pub fn compute_moseq_df(
    sessions: &SessionMap<SessionResults>,
    fps: f64,
    smooth_heading: bool,
) -> Result<Vec<FrameRecord>, UsageError> {
    check_fps(fps)?;

    let mut frames = vec![];
    for (name, session) in sessions {
        let expected = session.syllables.len();
        for (field, found) in [
            ("syllables_reindexed", session.syllables_reindexed.len()),
            ("centroid", session.centroid.len()),
            ("heading", session.heading.len()),
        ] {
            if found != expected {
                return Err(UsageError::LengthMismatch {
                    session: name.clone(),
                    field,
                    expected,
                    found,
                });
            }
        }

        let heading = if smooth_heading {
            filter_angle(&session.heading, HEADING_FILTER_SIZE)
        } else {
            session.heading.clone()
        };

        for t in 0..expected {
            let velocity = if t == 0 {
                0.0
            } else {
                let [x0, y0] = session.centroid[t - 1];
                let [x1, y1] = session.centroid[t];
                (x1 - x0).hypot(y1 - y0) * fps
            };
            frames.push(FrameRecord {
                group: session.group.clone(),
                session: name.clone(),
                frame_index: t,
                centroid: session.centroid[t],
                heading: heading[t],
                velocity_px_s: velocity,
                syllable: session.syllables[t],
                syllable_reindexed: session.syllables_reindexed[t],
                onset: false,
            });
        }
    }

    let mut previous = None;
    for frame in &mut frames {
        frame.onset = previous != Some(frame.syllable);
        previous = Some(frame.syllable);
    }

    info!(
        "Built frame table: {} frames from {} sessions",
        frames.len(),
        sessions.len()
    );
    Ok(frames)
}

#[derive(Default)]
struct Accumulator {
    frames: usize,
    heading: Vec<f64>,
    velocity: Vec<f64>,
    /// frame count per syllable instance
    instances: BTreeMap<usize, usize>,
}

/// Summarizes the frame table per (group, session, reindexed syllable).
///
/// Rows are ordered by group, session and syllable.
#[expect(clippy::cast_precision_loss)]
pub fn compute_stats_df(
    frames: &[FrameRecord],
    params: &StatsParams,
) -> Result<Vec<SyllableStats>, UsageError> {
    check_fps(params.fps)?;
    if frames.is_empty() {
        return Ok(vec![]);
    }

    let mut raw_counts = BTreeMap::<u32, usize>::new();
    for frame in frames {
        *raw_counts.entry(frame.syllable).or_default() += 1;
    }
    let total = frames.len() as f64;
    let retained = |frame: &&FrameRecord| raw_counts[&frame.syllable] as f64 / total > params.threshold;

    let mut sessions = BTreeMap::<(&str, &str), usize>::new();
    let mut syllables = BTreeMap::<u32, ()>::new();
    let mut cells = BTreeMap::<(&str, &str, u32), Accumulator>::new();
    let mut instance = 0;
    for frame in frames.iter().filter(retained) {
        if frame.onset {
            instance += 1;
        }
        let session = (frame.group.as_str(), frame.session.as_str());
        *sessions.entry(session).or_default() += 1;
        syllables.insert(frame.syllable_reindexed, ());

        let cell = cells
            .entry((session.0, session.1, frame.syllable_reindexed))
            .or_default();
        cell.frames += 1;
        cell.heading.push(frame.heading);
        cell.velocity.push(frame.velocity_px_s);
        *cell.instances.entry(instance).or_default() += 1;
    }

    let mut rows = vec![];
    for (&(group, session), &session_frames) in &sessions {
        for &syllable in syllables.keys() {
            let cell = cells.get(&(group, session, syllable));
            let count = cell.map_or(0, |c| c.frames) as f64;
            let frequency = if params.normalize {
                count / session_frames as f64
            } else {
                count
            };
            let heading = cell.and_then(|c| DescriptiveStats::new(c.heading.iter().copied()));
            let velocity = cell.and_then(|c| DescriptiveStats::new(c.velocity.iter().copied()));
            let duration = cell.map(|c| {
                let lengths = c.instances.values().sum::<usize>() as f64;
                lengths / c.instances.len() as f64 / params.fps
            });
            rows.push(SyllableStats {
                group: group.to_owned(),
                session: session.to_owned(),
                syllable,
                frequency,
                duration,
                heading_mean: heading.as_ref().map(|s| s.mean),
                heading_std: heading.as_ref().and_then(|s| s.sample_std_dev),
                heading_min: heading.as_ref().map(|s| s.min),
                heading_max: heading.as_ref().map(|s| s.max),
                velocity_px_s_mean: velocity.as_ref().map(|s| s.mean),
                velocity_px_s_std: velocity.as_ref().and_then(|s| s.sample_std_dev),
                velocity_px_s_min: velocity.as_ref().map(|s| s.min),
                velocity_px_s_max: velocity.as_ref().map(|s| s.max),
            });
        }
    }

    info!(
        "Summarized {} sessions x {} syllables (threshold {})",
        sessions.len(),
        syllables.len(),
        params.threshold
    );
    Ok(rows)
}

fn check_fps(fps: f64) -> Result<(), UsageError> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(UsageError::InvalidFps { fps })
    }
}
