//! Per-session keypoint trajectories
//!
//! A [`Trajectory`] holds the keypoint coordinates of one recording session,
//! frame by frame, together with an optional validity mask. Sessions are keyed
//! by caller-supplied identifiers in a [`SessionMap`], whose ordered iteration
//! fixes the order in which sessions are processed (and therefore the order of
//! random draws made while processing them).
//!
//! # Serialization
//!
//! ```json
//! {
//!   "session-01": {
//!     "coordinates": [[[0.0, 1.0], [0.5, 0.2], [1.0, -0.3]], ...],
//!     "mask": [true, true, false, ...]
//!   }
//! }
//! ```
//!
//! `mask` may be omitted, in which case every frame is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from session identifier to per-session data.
pub type SessionMap<T> = BTreeMap<String, T>;

/// Coordinates of every keypoint in one frame: `keypoints × dim`.
pub type Frame = Vec<Vec<f64>>;

/// Keypoint coordinates of a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Coordinates indexed as `[frame][keypoint][axis]`
    pub coordinates: Vec<Frame>,
    /// Per-frame validity; `None` means every frame is valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<bool>>,
}

/// Dimensions of a well-formed trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub frames: usize,
    pub keypoints: usize,
    pub dim: usize,
}

impl Shape {
    /// Length of a flattened per-frame feature vector.
    #[must_use]
    pub fn features(&self) -> usize {
        self.keypoints * self.dim
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrajectoryError {
    #[display("frame {frame} has {found} keypoints, expected {expected}")]
    KeypointCount {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[display("frame {frame}, keypoint {keypoint} has {found} coordinates, expected {expected}")]
    Dimension {
        frame: usize,
        keypoint: usize,
        expected: usize,
        found: usize,
    },
    #[display("mask has {found} entries but the trajectory has {expected} frames")]
    MaskLength { expected: usize, found: usize },
}

impl Trajectory {
    /// Creates a trajectory in which every frame is valid.
    #[must_use]
    pub fn new(coordinates: Vec<Frame>) -> Self {
        Self {
            coordinates,
            mask: None,
        }
    }

    /// Creates a trajectory with an explicit validity mask.
    #[must_use]
    pub fn with_mask(coordinates: Vec<Frame>, mask: Vec<bool>) -> Self {
        Self {
            coordinates,
            mask: Some(mask),
        }
    }

    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.coordinates.len()
    }

    /// Checks that every frame has the same number of keypoints and every
    /// keypoint the same number of coordinates, and that the mask (if any)
    /// covers every frame.
    ///
    /// An empty trajectory has shape `0 × 0 × 0`.
    pub fn shape(&self) -> Result<Shape, TrajectoryError> {
        let frames = self.coordinates.len();
        if let Some(mask) = &self.mask
            && mask.len() != frames
        {
            return Err(TrajectoryError::MaskLength {
                expected: frames,
                found: mask.len(),
            });
        }

        let Some(first) = self.coordinates.first() else {
            return Ok(Shape {
                frames: 0,
                keypoints: 0,
                dim: 0,
            });
        };
        let keypoints = first.len();
        let dim = first.first().map_or(0, Vec::len);

        for (frame, points) in self.coordinates.iter().enumerate() {
            if points.len() != keypoints {
                return Err(TrajectoryError::KeypointCount {
                    frame,
                    expected: keypoints,
                    found: points.len(),
                });
            }
            for (keypoint, point) in points.iter().enumerate() {
                if point.len() != dim {
                    return Err(TrajectoryError::Dimension {
                        frame,
                        keypoint,
                        expected: dim,
                        found: point.len(),
                    });
                }
            }
        }

        Ok(Shape {
            frames,
            keypoints,
            dim,
        })
    }

    /// The validity mask, materialized for every frame.
    #[must_use]
    pub fn valid_mask(&self) -> Vec<bool> {
        match &self.mask {
            Some(mask) => mask.clone(),
            None => vec![true; self.coordinates.len()],
        }
    }

    /// Keeps only the keypoints at `indices`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for some frame.
    #[must_use]
    pub fn select_keypoints(&self, indices: &[usize]) -> Self {
        let coordinates = self
            .coordinates
            .iter()
            .map(|points| indices.iter().map(|&i| points[i].clone()).collect())
            .collect();
        Self {
            coordinates,
            mask: self.mask.clone(),
        }
    }

    /// Applies `f` to every keypoint of every frame, keeping the mask.
    #[must_use]
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&[f64]) -> Vec<f64>,
    {
        let coordinates = self
            .coordinates
            .iter()
            .map(|points| points.iter().map(|p| f(p)).collect())
            .collect();
        Self {
            coordinates,
            mask: self.mask.clone(),
        }
    }

    /// Time series of one flattened feature (`keypoint * dim + axis`).
    pub(crate) fn feature_series(&self, keypoint: usize, axis: usize) -> Vec<f64> {
        self.coordinates
            .iter()
            .map(|points| points[keypoint][axis])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_frames() -> Trajectory {
        Trajectory::new(vec![
            vec![vec![0.0, 1.0], vec![2.0, 3.0]],
            vec![vec![4.0, 5.0], vec![6.0, 7.0]],
        ])
    }

    #[test]
    fn test_shape() {
        let shape = two_frames().shape().unwrap();
        assert_eq!(
            shape,
            Shape {
                frames: 2,
                keypoints: 2,
                dim: 2
            }
        );
        assert_eq!(shape.features(), 4);
    }

    #[test]
    fn test_ragged_frames_are_rejected() {
        let mut trajectory = two_frames();
        trajectory.coordinates[1].pop();
        assert!(matches!(
            trajectory.shape(),
            Err(TrajectoryError::KeypointCount { frame: 1, .. })
        ));

        let mut trajectory = two_frames();
        trajectory.coordinates[0][1].push(0.0);
        assert!(matches!(
            trajectory.shape(),
            Err(TrajectoryError::Dimension {
                frame: 0,
                keypoint: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_mask_length_is_checked() {
        let trajectory = Trajectory::with_mask(two_frames().coordinates, vec![true]);
        assert!(matches!(
            trajectory.shape(),
            Err(TrajectoryError::MaskLength {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_missing_mask_means_all_valid() {
        let trajectory = two_frames();
        assert_eq!(trajectory.valid_mask(), vec![true, true]);
    }

    #[test]
    fn test_select_keypoints() {
        let selected = two_frames().select_keypoints(&[1]);
        assert_eq!(selected.coordinates[0], vec![vec![2.0, 3.0]]);
        assert_eq!(selected.coordinates[1], vec![vec![6.0, 7.0]]);
    }

    #[test]
    fn test_deserialize_without_mask() {
        let json = r#"{"coordinates": [[[0.0, 1.0]], [[1.0, 2.0]]]}"#;
        let trajectory: Trajectory = serde_json::from_str(json).unwrap();
        assert_eq!(trajectory.mask, None);
        assert_eq!(trajectory.num_frames(), 2);
    }
}
