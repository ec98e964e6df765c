//! Changepoint detection in keypoint data
//!
//! Changepoints are peaks of a change score computed by:
//!
//! 1. Differentiating egocentrically aligned keypoint coordinates
//! 2. Z-scoring the absolute value of each derivative within its session
//! 3. Counting, per frame, the keypoint coordinates whose z-score crosses a
//!    threshold
//! 4. Computing a p-value for each count against a temporally shuffled null
//!    distribution, then applying Benjamini-Hochberg correction
//! 5. Smoothing the significance score `-log10(p)` across time
//!
//! Steps 3-5 run for a range of thresholds. Each threshold yields an
//! independent [`ThresholdCandidate`]; the final result is the candidate with
//! the most changepoints.
//!
//! # Randomness
//!
//! The shuffled null is drawn from a generator supplied by the caller. One
//! seed per threshold is drawn from it up front, so candidates do not share
//! random state and two calls with identically seeded generators return
//! identical results.
//!
//! # Example
//!
//! ```
//! use moseq_analysis::{
//!     changepoint::{ChangepointParams, detect_changepoints},
//!     trajectory::{SessionMap, Trajectory},
//! };
//! use rand::SeedableRng as _;
//!
//! let frames = (0..40)
//!     .map(|t| {
//!         let wiggle = if t < 20 { 0.0 } else { 0.5 };
//!         vec![vec![1.0, 0.0], vec![0.0, wiggle], vec![-1.0, 0.0]]
//!     })
//!     .collect();
//! let mut sessions = SessionMap::new();
//! sessions.insert("s1".to_owned(), Trajectory::new(frames));
//!
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(0);
//! let result =
//!     detect_changepoints(&sessions, &[0], &[2], &ChangepointParams::default(), &mut rng)?;
//! assert_eq!(result.change_scores["s1"].len(), 40);
//! # Ok::<(), moseq_analysis::changepoint::ChangepointError>(())
//! ```

use log::{debug, info};
use moseq_stats::{
    correction::CorrectionMethod,
    descriptive::{masked_mean, masked_std_dev},
    percentiles::{compute_percentile, linspace},
    permutation::permute_cyclic,
    signal::{filtered_derivative, gaussian_filter1d, local_maxima},
};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::{
    alignment::align_egocentric,
    config::{AnalysisConfig, BodypartError},
    trajectory::{Frame, SessionMap, Shape, Trajectory, TrajectoryError},
};

/// Added to the standard deviation before z-scoring.
const STD_EPSILON: f64 = 1e-8;
/// Half-width of the uniform jitter added to null crossing counts.
const NULL_JITTER: f64 = 0.1;
/// Lower and upper percentiles bounding the threshold scan.
const THRESHOLD_PERCENTILES: (f64, f64) = (1.0, 99.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangepointParams {
    /// False-discovery rate; changepoints need an adjusted `p < alpha`
    pub alpha: f64,
    /// Half-width `k` of the symmetric derivative kernel
    pub derivative_kernel_size: usize,
    /// Standard deviation (in frames) of the Gaussian smoothing of the score
    pub smoothing_kernel_size: f64,
    /// Number of z-score thresholds to scan
    pub num_thresholds: usize,
}

impl Default for ChangepointParams {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            derivative_kernel_size: 3,
            smoothing_kernel_size: 1.0,
            num_thresholds: 20,
        }
    }
}

impl ChangepointParams {
    pub fn validate(&self) -> Result<(), ChangepointError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ChangepointError::InvalidAlpha { alpha: self.alpha });
        }
        if self.derivative_kernel_size == 0 {
            return Err(ChangepointError::ZeroDerivativeKernel);
        }
        if !(self.smoothing_kernel_size.is_finite() && self.smoothing_kernel_size >= 0.0) {
            return Err(ChangepointError::InvalidSmoothingKernel {
                size: self.smoothing_kernel_size,
            });
        }
        if self.num_thresholds == 0 {
            return Err(ChangepointError::ZeroThresholds);
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ChangepointError {
    #[display("alpha must be in (0, 1], got {alpha}")]
    InvalidAlpha { alpha: f64 },
    #[display("derivative_kernel_size must be at least 1")]
    ZeroDerivativeKernel,
    #[display("smoothing_kernel_size must be a non-negative finite number, got {size}")]
    InvalidSmoothingKernel { size: f64 },
    #[display("num_thresholds must be at least 1")]
    ZeroThresholds,
    #[display("{option} must contain at least one keypoint index")]
    EmptyKeypoints { option: &'static str },
    #[display("{option} index {index} is out of range for {keypoints} keypoints")]
    KeypointOutOfRange {
        option: &'static str,
        index: usize,
        keypoints: usize,
    },
    #[display("session '{session}': {source}")]
    InvalidTrajectory {
        session: String,
        source: TrajectoryError,
    },
    #[display("session '{session}' has {found} keypoints, expected {expected}")]
    KeypointCountMismatch {
        session: String,
        expected: usize,
        found: usize,
    },
    #[display("session '{session}' has {found} coordinates per keypoint, expected {expected}")]
    DimensionMismatch {
        session: String,
        expected: usize,
        found: usize,
    },
    #[display("egocentric alignment needs at least 2 coordinates per keypoint, got {dim}")]
    TooFewDimensions { dim: usize },
    #[display("{source}")]
    Bodypart { source: BodypartError },
}

/// Outcome of testing a single z-score threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCandidate {
    pub threshold: f64,
    pub changepoints: SessionMap<Vec<usize>>,
    pub change_scores: SessionMap<Vec<f64>>,
}

impl ThresholdCandidate {
    /// Total number of changepoints across sessions.
    #[must_use]
    pub fn num_changepoints(&self) -> usize {
        self.changepoints.values().map(Vec::len).sum()
    }
}

/// Changepoints at the best threshold plus diagnostic signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangepointResult {
    /// Significant local maxima of the change score, per session
    pub changepoints: SessionMap<Vec<usize>>,
    /// Smoothed `-log10(p)` per frame, per session
    pub change_scores: SessionMap<Vec<f64>>,
    /// Egocentrically aligned keypoints (`frames × keypoints × dim`)
    pub aligned_coordinates: SessionMap<Vec<Frame>>,
    /// Z-scored absolute derivatives (`frames × keypoints × dim`)
    pub zscored_derivatives: SessionMap<Vec<Frame>>,
    /// Threshold that produced the most changepoints
    pub threshold: f64,
}

impl ChangepointResult {
    #[must_use]
    pub fn num_changepoints(&self) -> usize {
        self.changepoints.values().map(Vec::len).sum()
    }
}

/// Z-scored derivative features of one session.
#[derive(Debug, Clone)]
struct SessionFeatures {
    mask: Vec<bool>,
    /// `frames × features`
    zscored: Vec<Vec<f64>>,
}

impl SessionFeatures {
    fn num_frames(&self) -> usize {
        self.mask.len()
    }

    fn valid_frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(t, _)| t)
    }
}

/// Finds changepoints in keypoint trajectories.
///
/// `anterior` and `posterior` are keypoint indices defining the heading used
/// for egocentric alignment. All sessions must share the same keypoint count
/// and dimensionality.
///
/// The scan always produces a result; sessions without any significant peak
/// get an empty changepoint list. When no session has a valid frame, every
/// change score is zero and the threshold is `0.0`.
pub fn detect_changepoints<R>(
    trajectories: &SessionMap<Trajectory>,
    anterior: &[usize],
    posterior: &[usize],
    params: &ChangepointParams,
    rng: &mut R,
) -> Result<ChangepointResult, ChangepointError>
where
    R: Rng + ?Sized,
{
    params.validate()?;
    let shape = common_shape(trajectories)?;
    check_indices(anterior, "anterior", shape.keypoints)?;
    check_indices(posterior, "posterior", shape.keypoints)?;

    info!("Aligning keypoints for {} sessions", trajectories.len());
    let aligned = trajectories
        .iter()
        .map(|(name, trajectory)| {
            let alignment = align_egocentric(trajectory, anterior, posterior);
            (name.clone(), alignment.aligned)
        })
        .collect::<SessionMap<_>>();

    info!("Differentiating and z-scoring");
    let features = aligned
        .iter()
        .map(|(name, trajectory)| {
            let features = zscored_derivatives(trajectory, shape, params.derivative_kernel_size);
            (name.clone(), features)
        })
        .collect::<SessionMap<_>>();

    let thresholds = scan_thresholds(&features, params.num_thresholds);
    let best = match thresholds {
        Some(thresholds) => {
            let seeds = thresholds.iter().map(|_| rng.random()).collect::<Vec<u64>>();
            info!("Testing {} thresholds", thresholds.len());
            let candidates = thresholds
                .iter()
                .zip(seeds)
                .map(|(&threshold, seed)| {
                    let mut rng = Pcg64::seed_from_u64(seed);
                    evaluate_threshold(&features, threshold, params, &mut rng)
                })
                .collect::<Vec<_>>();
            select_best(candidates)
        }
        None => None,
    }
    .unwrap_or_else(|| empty_candidate(&features));
    info!(
        "Selected threshold {:.3} with {} changepoints",
        best.threshold,
        best.num_changepoints()
    );

    let zscored_derivatives = features
        .iter()
        .map(|(name, f)| (name.clone(), unflatten(&f.zscored, shape)))
        .collect();
    let aligned_coordinates = aligned
        .into_iter()
        .map(|(name, trajectory)| (name, trajectory.coordinates))
        .collect();

    Ok(ChangepointResult {
        changepoints: best.changepoints,
        change_scores: best.change_scores,
        aligned_coordinates,
        zscored_derivatives,
        threshold: best.threshold,
    })
}

/// Finds changepoints using body-part names from `config`.
///
/// Trajectories are first reduced to `use_bodyparts` (when set), then the
/// anterior/posterior names are resolved against the remaining keypoints.
/// Parameters are taken from `config.changepoint`.
pub fn detect_changepoints_with_config<R>(
    trajectories: &SessionMap<Trajectory>,
    config: &AnalysisConfig,
    rng: &mut R,
) -> Result<ChangepointResult, ChangepointError>
where
    R: Rng + ?Sized,
{
    let bodypart = |source| ChangepointError::Bodypart { source };
    let anterior = config.anterior_indices().map_err(bodypart)?;
    let posterior = config.posterior_indices().map_err(bodypart)?;

    if !config.bodyparts.is_empty() {
        let shape = common_shape(trajectories)?;
        if shape.frames > 0 && shape.keypoints != config.bodyparts.len() {
            return Err(ChangepointError::KeypointCountMismatch {
                session: first_nonempty(trajectories).unwrap_or_default(),
                expected: config.bodyparts.len(),
                found: shape.keypoints,
            });
        }
    }

    match config.use_indices().map_err(bodypart)? {
        Some(indices) => {
            let subset = trajectories
                .iter()
                .map(|(name, t)| (name.clone(), t.select_keypoints(&indices)))
                .collect();
            detect_changepoints(&subset, &anterior, &posterior, &config.changepoint, rng)
        }
        None => detect_changepoints(trajectories, &anterior, &posterior, &config.changepoint, rng),
    }
}

fn first_nonempty(trajectories: &SessionMap<Trajectory>) -> Option<String> {
    trajectories
        .iter()
        .find(|(_, t)| t.num_frames() > 0)
        .map(|(name, _)| name.clone())
}

/// Shape shared by every non-empty session.
fn common_shape(trajectories: &SessionMap<Trajectory>) -> Result<Shape, ChangepointError> {
    let mut common: Option<Shape> = None;
    for (session, trajectory) in trajectories {
        let shape = trajectory
            .shape()
            .map_err(|source| ChangepointError::InvalidTrajectory {
                session: session.clone(),
                source,
            })?;
        if shape.frames == 0 {
            continue;
        }
        match common {
            None => common = Some(shape),
            Some(expected) => {
                if shape.keypoints != expected.keypoints {
                    return Err(ChangepointError::KeypointCountMismatch {
                        session: session.clone(),
                        expected: expected.keypoints,
                        found: shape.keypoints,
                    });
                }
                if shape.dim != expected.dim {
                    return Err(ChangepointError::DimensionMismatch {
                        session: session.clone(),
                        expected: expected.dim,
                        found: shape.dim,
                    });
                }
            }
        }
    }

    let shape = common.unwrap_or(Shape {
        frames: 0,
        keypoints: 0,
        dim: 2,
    });
    if shape.dim < 2 {
        return Err(ChangepointError::TooFewDimensions { dim: shape.dim });
    }
    Ok(shape)
}

fn check_indices(
    indices: &[usize],
    option: &'static str,
    keypoints: usize,
) -> Result<(), ChangepointError> {
    if indices.is_empty() {
        return Err(ChangepointError::EmptyKeypoints { option });
    }
    // Nothing to index into when every session is empty.
    if keypoints == 0 {
        return Ok(());
    }
    match indices.iter().find(|&&i| i >= keypoints) {
        Some(&index) => Err(ChangepointError::KeypointOutOfRange {
            option,
            index,
            keypoints,
        }),
        None => Ok(()),
    }
}

/// Absolute symmetric derivative of every flattened coordinate, z-scored over
/// the session's valid frames.
fn zscored_derivatives(trajectory: &Trajectory, shape: Shape, ksize: usize) -> SessionFeatures {
    let mask = trajectory.valid_mask();
    let frames = trajectory.num_frames();
    let mut zscored = vec![vec![0.0; shape.features()]; frames];
    if frames == 0 {
        return SessionFeatures { mask, zscored };
    }

    for keypoint in 0..shape.keypoints {
        for axis in 0..shape.dim {
            let series = trajectory.feature_series(keypoint, axis);
            let derivative = filtered_derivative(&series, ksize)
                .into_iter()
                .map(f64::abs)
                .collect::<Vec<_>>();
            let mean = masked_mean(&derivative, &mask);
            let std = masked_std_dev(&derivative, &mask, mean);
            let feature = keypoint * shape.dim + axis;
            for (row, d) in zscored.iter_mut().zip(&derivative) {
                row[feature] = (d - mean) / (std + STD_EPSILON);
            }
        }
    }

    SessionFeatures { mask, zscored }
}

/// Thresholds linearly spaced between the low and high percentiles of all
/// valid z-scores, or `None` when there is no valid value.
fn scan_thresholds(
    features: &SessionMap<SessionFeatures>,
    num_thresholds: usize,
) -> Option<Vec<f64>> {
    let mut values = features
        .values()
        .flat_map(|f| f.valid_frames().flat_map(|t| f.zscored[t].iter().copied()))
        .collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let (low, high) = THRESHOLD_PERCENTILES;
    Some(linspace(
        compute_percentile(&values, low),
        compute_percentile(&values, high),
        num_thresholds,
    ))
}

/// Number of features above `threshold` in each frame.
#[expect(clippy::cast_precision_loss)]
fn crossing_counts(indicators: &[Vec<bool>], frames: usize) -> Vec<f64> {
    (0..frames)
        .map(|t| indicators.iter().filter(|column| column[t]).count() as f64)
        .collect()
}

/// Tests one threshold: real crossing counts against a cyclically shuffled
/// null, pooled over the valid frames of every session.
fn evaluate_threshold<R>(
    features: &SessionMap<SessionFeatures>,
    threshold: f64,
    params: &ChangepointParams,
    rng: &mut R,
) -> ThresholdCandidate
where
    R: Rng + ?Sized,
{
    let mut real = vec![];
    let mut null = vec![];
    for session in features.values() {
        let frames = session.num_frames();
        let num_features = session.zscored.first().map_or(0, Vec::len);
        // column-major indicators so each feature can be shuffled on its own
        let indicators = (0..num_features)
            .map(|f| {
                session
                    .zscored
                    .iter()
                    .map(|row| row[f] > threshold)
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let shuffled = indicators
            .iter()
            .map(|column| permute_cyclic(column, &session.mask, false, rng))
            .collect::<Vec<_>>();

        let real_counts = crossing_counts(&indicators, frames);
        let null_counts = crossing_counts(&shuffled, frames);
        real.extend(session.valid_frames().map(|t| real_counts[t]));
        null.extend(session.valid_frames().map(|t| null_counts[t]));
    }
    for value in &mut null {
        *value += rng.random_range(-NULL_JITTER..NULL_JITTER);
    }
    null.sort_by(f64::total_cmp);

    let pvalues = real
        .iter()
        .map(|&count| empirical_pvalue(&null, count))
        .collect::<Vec<_>>();
    let adjusted = CorrectionMethod::FdrBh.adjust(&pvalues);

    let mut changepoints = SessionMap::new();
    let mut change_scores = SessionMap::new();
    let mut pooled = adjusted.into_iter();
    for (name, session) in features {
        let mut pvalues = vec![1.0; session.num_frames()];
        for t in session.valid_frames() {
            pvalues[t] = pooled.next().unwrap_or(1.0);
        }
        let significance = pvalues
            .iter()
            .map(|p| -p.max(f64::MIN_POSITIVE).log10())
            .collect::<Vec<_>>();
        let score = gaussian_filter1d(&significance, params.smoothing_kernel_size);
        let peaks = local_maxima(&score)
            .into_iter()
            .filter(|&t| session.mask[t] && pvalues[t] < params.alpha)
            .collect();
        changepoints.insert(name.clone(), peaks);
        change_scores.insert(name.clone(), score);
    }

    let candidate = ThresholdCandidate {
        threshold,
        changepoints,
        change_scores,
    };
    debug!(
        "threshold {threshold:.3}: {} changepoints",
        candidate.num_changepoints()
    );
    candidate
}

/// One-sided empirical p-value of `count` within the sorted null:
/// `1 - (searchsorted_left(null, count) - 1) / N`.
#[expect(clippy::cast_precision_loss)]
fn empirical_pvalue(sorted_null: &[f64], count: f64) -> f64 {
    let rank = sorted_null.partition_point(|v| *v < count) as f64;
    1.0 - (rank - 1.0) / sorted_null.len() as f64
}

/// The first candidate with the greatest number of changepoints.
fn select_best(candidates: Vec<ThresholdCandidate>) -> Option<ThresholdCandidate> {
    candidates.into_iter().reduce(|best, candidate| {
        if candidate.num_changepoints() > best.num_changepoints() {
            candidate
        } else {
            best
        }
    })
}

fn empty_candidate(features: &SessionMap<SessionFeatures>) -> ThresholdCandidate {
    ThresholdCandidate {
        threshold: 0.0,
        changepoints: features.keys().map(|name| (name.clone(), vec![])).collect(),
        change_scores: features
            .iter()
            .map(|(name, f)| (name.clone(), vec![0.0; f.num_frames()]))
            .collect(),
    }
}

fn unflatten(rows: &[Vec<f64>], shape: Shape) -> Vec<Frame> {
    rows.iter()
        .map(|row| row.chunks(shape.dim).map(<[f64]>::to_vec).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn still_session(frames: usize) -> Trajectory {
        Trajectory::new(vec![vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![-1.0, 0.0]]; frames])
    }

    fn sessions(list: Vec<(&str, Trajectory)>) -> SessionMap<Trajectory> {
        list.into_iter()
            .map(|(name, t)| (name.to_owned(), t))
            .collect()
    }

    #[test]
    fn test_params_validation() {
        let bad = [
            ChangepointParams {
                alpha: 0.0,
                ..ChangepointParams::default()
            },
            ChangepointParams {
                derivative_kernel_size: 0,
                ..ChangepointParams::default()
            },
            ChangepointParams {
                smoothing_kernel_size: f64::NAN,
                ..ChangepointParams::default()
            },
            ChangepointParams {
                num_thresholds: 0,
                ..ChangepointParams::default()
            },
        ];
        for params in bad {
            assert!(params.validate().is_err(), "{params:?}");
        }
        assert!(ChangepointParams::default().validate().is_ok());
    }

    #[test]
    fn test_empirical_pvalue_convention() {
        let null = [0.0, 1.0, 2.0, 3.0];
        // larger than every null value: rank 4
        assert_relative_eq!(empirical_pvalue(&null, 10.0), 0.25);
        // smaller than every null value: rank 0
        assert_relative_eq!(empirical_pvalue(&null, -1.0), 1.25);
        assert_relative_eq!(empirical_pvalue(&null, 2.0), 0.75);
    }

    #[test]
    fn test_select_best_keeps_first_maximum() {
        let candidate = |threshold: f64, n: usize| ThresholdCandidate {
            threshold,
            changepoints: [("s".to_owned(), (0..n).collect())].into_iter().collect(),
            change_scores: SessionMap::new(),
        };
        let best = select_best(vec![candidate(0.1, 1), candidate(0.2, 3), candidate(0.3, 3)]);
        assert_eq!(best.unwrap().threshold, 0.2);
        assert!(select_best(vec![]).is_none());
    }

    #[test]
    fn test_zero_variance_features_stay_finite() {
        let trajectories = sessions(vec![("still", still_session(30))]);
        let mut rng = Pcg64::seed_from_u64(1);
        let result =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap();
        assert!(result.zscored_derivatives["still"]
            .iter()
            .flatten()
            .flatten()
            .all(|z| z.is_finite()));
        assert!(result.change_scores["still"].iter().all(|s| s.is_finite()));
        assert!(result.changepoints["still"].is_empty());
    }

    #[test]
    fn test_all_invalid_session_is_excluded() {
        let mut masked = still_session(10);
        masked.mask = Some(vec![false; 10]);
        let trajectories = sessions(vec![("masked", masked)]);
        let mut rng = Pcg64::seed_from_u64(2);
        let result =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap();
        assert_eq!(result.threshold, 0.0);
        assert!(result.changepoints["masked"].is_empty());
        assert_eq!(result.change_scores["masked"], vec![0.0; 10]);
    }

    #[test]
    fn test_short_sessions_have_no_peaks() {
        let trajectories = sessions(vec![("a", still_session(2)), ("b", still_session(1))]);
        let mut rng = Pcg64::seed_from_u64(3);
        let result =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap();
        assert!(result.changepoints.values().all(Vec::is_empty));
        assert_eq!(result.change_scores["a"].len(), 2);
    }

    #[test]
    fn test_output_shapes_match_input() {
        let trajectories = sessions(vec![("a", still_session(12))]);
        let mut rng = Pcg64::seed_from_u64(4);
        let result =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap();
        let derivatives = &result.zscored_derivatives["a"];
        assert_eq!(derivatives.len(), 12);
        assert_eq!(derivatives[0].len(), 3);
        assert_eq!(derivatives[0][0].len(), 2);
        assert_eq!(result.aligned_coordinates["a"].len(), 12);
    }

    #[test]
    fn test_index_errors_name_the_option() {
        let trajectories = sessions(vec![("a", still_session(5))]);
        let mut rng = Pcg64::seed_from_u64(5);
        let err =
            detect_changepoints(&trajectories, &[7], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap_err();
        assert!(matches!(
            err,
            ChangepointError::KeypointOutOfRange {
                option: "anterior",
                index: 7,
                keypoints: 3
            }
        ));
        let err =
            detect_changepoints(&trajectories, &[0], &[], &ChangepointParams::default(), &mut rng)
                .unwrap_err();
        assert!(err.to_string().contains("posterior"));
    }

    #[test]
    fn test_mismatched_sessions_are_rejected() {
        let four_points = Trajectory::new(vec![vec![vec![0.0, 0.0]; 4]; 5]);
        let trajectories = sessions(vec![("a", still_session(5)), ("b", four_points)]);
        let mut rng = Pcg64::seed_from_u64(6);
        let err =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap_err();
        assert!(matches!(
            err,
            ChangepointError::KeypointCountMismatch { ref session, expected: 3, found: 4 }
                if session == "b"
        ));
    }

    #[test]
    fn test_one_dimensional_keypoints_are_rejected() {
        let trajectories = sessions(vec![("a", Trajectory::new(vec![vec![vec![0.0]; 3]; 4]))]);
        let mut rng = Pcg64::seed_from_u64(7);
        let err =
            detect_changepoints(&trajectories, &[0], &[2], &ChangepointParams::default(), &mut rng)
                .unwrap_err();
        assert!(matches!(err, ChangepointError::TooFewDimensions { dim: 1 }));
    }

    #[test]
    fn test_config_resolves_names_and_subsets() {
        let body = vec![
            vec![1.0, 0.0],
            vec![5.0, 5.0],
            vec![0.0, 0.0],
            vec![-1.0, 0.0],
        ];
        let trajectories = sessions(vec![("a", Trajectory::new(vec![body; 8]))]);
        let config = AnalysisConfig {
            bodyparts: ["nose", "paw", "spine", "tail"].map(str::to_owned).to_vec(),
            use_bodyparts: Some(["nose", "spine", "tail"].map(str::to_owned).to_vec()),
            anterior_bodyparts: vec!["nose".to_owned()],
            posterior_bodyparts: vec!["tail".to_owned()],
            ..AnalysisConfig::default()
        };
        let mut rng = Pcg64::seed_from_u64(8);
        let result = detect_changepoints_with_config(&trajectories, &config, &mut rng).unwrap();
        assert_eq!(result.aligned_coordinates["a"][0].len(), 3);

        let config = AnalysisConfig {
            anterior_bodyparts: vec!["snout".to_owned()],
            ..config
        };
        let err = detect_changepoints_with_config(&trajectories, &config, &mut rng).unwrap_err();
        assert!(err.to_string().contains("snout"));
    }

    #[test]
    fn test_config_bodypart_count_must_match_data() {
        let trajectories = sessions(vec![("a", still_session(4))]);
        let config = AnalysisConfig {
            bodyparts: ["nose", "tail"].map(str::to_owned).to_vec(),
            anterior_bodyparts: vec!["nose".to_owned()],
            posterior_bodyparts: vec!["tail".to_owned()],
            ..AnalysisConfig::default()
        };
        let mut rng = Pcg64::seed_from_u64(9);
        let err = detect_changepoints_with_config(&trajectories, &config, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            ChangepointError::KeypointCountMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }
}
