//! Egocentric alignment of keypoints
//!
//! Each frame is translated so the body centroid sits at the origin and
//! rotated so the posterior-to-anterior heading vector points along `+x`.
//! Only the first two axes take part in the rotation; further axes (height)
//! are left untranslated and unrotated.
//!
//! ```text
//!  world frame                 egocentric frame
//!
//!        a                        p ----c----> a   (+x)
//!       /
//!      c
//!     /
//!    p
//! ```

use serde::{Deserialize, Serialize};

use crate::trajectory::{Frame, Trajectory};

/// Aligned coordinates plus the per-frame transform that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgocentricAlignment {
    /// Body-centered, heading-normalized trajectory (mask unchanged)
    pub aligned: Trajectory,
    /// Planar centroid of each frame
    pub centroids: Vec<[f64; 2]>,
    /// Heading of each frame in radians
    pub headings: Vec<f64>,
}

/// Rotates the first two coordinates of `point` by `angle` radians.
#[must_use]
pub fn rotate_xy(point: &[f64], angle: f64) -> Vec<f64> {
    let (sin, cos) = angle.sin_cos();
    let mut out = point.to_vec();
    out[0] = cos * point[0] - sin * point[1];
    out[1] = sin * point[0] + cos * point[1];
    out
}

/// Heading of a frame: direction from the posterior to the anterior keypoints.
///
/// The anterior and posterior locations are the means of the respective
/// keypoints' planar coordinates.
#[must_use]
pub fn heading(points: &Frame, anterior: &[usize], posterior: &[usize]) -> f64 {
    let [ax, ay] = planar_mean(points, anterior);
    let [px, py] = planar_mean(points, posterior);
    (ay - py).atan2(ax - px)
}

/// Aligns every frame of `trajectory` into the egocentric reference frame.
///
/// # Panics
///
/// Panics if an anterior/posterior index is out of range or frames have fewer
/// than two coordinates per keypoint. Callers validate these beforehand.
#[must_use]
pub fn align_egocentric(
    trajectory: &Trajectory,
    anterior: &[usize],
    posterior: &[usize],
) -> EgocentricAlignment {
    let mut coordinates = Vec::with_capacity(trajectory.num_frames());
    let mut centroids = Vec::with_capacity(trajectory.num_frames());
    let mut headings = Vec::with_capacity(trajectory.num_frames());

    for points in &trajectory.coordinates {
        let h = heading(points, anterior, posterior);
        let all = (0..points.len()).collect::<Vec<_>>();
        let [cx, cy] = planar_mean(points, &all);

        let aligned = points
            .iter()
            .map(|p| {
                let mut shifted = p.clone();
                shifted[0] -= cx;
                shifted[1] -= cy;
                rotate_xy(&shifted, -h)
            })
            .collect();

        coordinates.push(aligned);
        centroids.push([cx, cy]);
        headings.push(h);
    }

    EgocentricAlignment {
        aligned: Trajectory {
            coordinates,
            mask: trajectory.mask.clone(),
        },
        centroids,
        headings,
    }
}

#[expect(clippy::cast_precision_loss)]
fn planar_mean(points: &Frame, indices: &[usize]) -> [f64; 2] {
    let n = indices.len().max(1) as f64;
    let (x, y) = indices
        .iter()
        .fold((0.0, 0.0), |(x, y), &i| (x + points[i][0], y + points[i][1]));
    [x / n, y / n]
}
