//! End-to-end changepoint detection on synthetic recordings
//!
//! Each synthetic animal has three keypoints on a line (nose, body, tail). The
//! body keypoint switches between two postures; every switch is a pose change
//! that the detector should report. The whole body also drifts and turns
//! slowly in world coordinates, which egocentric alignment removes.

use std::{cmp::Ordering, ops::RangeInclusive};

use approx::assert_relative_eq;
use moseq_analysis::{
    alignment::rotate_xy,
    changepoint::{ChangepointParams, ChangepointResult, detect_changepoints},
    trajectory::{Frame, SessionMap, Trajectory},
};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;

const FRAMES: u32 = 100;
const NOSE: usize = 0;
const TAIL: usize = 2;

/// Posture switch centered on frame `center`: 0 before, 1/2 on, 1 after.
fn step(t: u32, center: u32) -> f64 {
    match t.cmp(&center) {
        Ordering::Less => 0.0,
        Ordering::Equal => 0.5,
        Ordering::Greater => 1.0,
    }
}

/// Builds a session whose posture at frame `t` is `posture(t)` in `[0, 1]`.
fn session<F>(posture: F, rng: &mut Pcg64) -> Trajectory
where
    F: Fn(u32) -> f64,
{
    let coordinates = (0..FRAMES)
        .map(|t| {
            let f = posture(t);
            let body = [[1.0, 0.0], [0.9 * f, 1.5 * f], [-1.0, 0.0]];
            let t = f64::from(t);
            body.iter()
                .map(|[x, y]| {
                    let point = [
                        x + rng.random_range(-1e-4..1e-4),
                        y + rng.random_range(-1e-4..1e-4),
                    ];
                    let mut world = rotate_xy(&point, 0.3 + 0.01 * t);
                    world[0] += 0.05 * t;
                    world[1] -= 0.02 * t;
                    world
                })
                .collect::<Frame>()
        })
        .collect();
    Trajectory::new(coordinates)
}

/// Two sessions sharing posture switches at frames 20 and 80; only `with_change`
/// also switches at frame 50.
///
/// The control session is not left flat. The null pools shuffled crossings
/// from every session and every threshold is BH-corrected, so a recording
/// whose only event is the frame 50 switch (or one that is pure noise) never
/// reaches significance. The shared switches give the scan a threshold at
/// which real crossings clear the null, and the test then checks that frame
/// 50 is found only where it was injected.
fn scenario() -> SessionMap<Trajectory> {
    let mut rng = Pcg64::seed_from_u64(2024);
    let mut sessions = SessionMap::new();
    sessions.insert(
        "with_change".to_owned(),
        session(|t| step(t, 20) - step(t, 50) + step(t, 80), &mut rng),
    );
    sessions.insert(
        "without_change".to_owned(),
        session(|t| step(t, 20) - step(t, 80), &mut rng),
    );
    sessions
}

fn detect(sessions: &SessionMap<Trajectory>, seed: u64) -> ChangepointResult {
    let mut rng = Pcg64::seed_from_u64(seed);
    detect_changepoints(
        sessions,
        &[NOSE],
        &[TAIL],
        &ChangepointParams::default(),
        &mut rng,
    )
    .unwrap()
}

fn has_changepoint_in(
    result: &ChangepointResult,
    session: &str,
    frames: RangeInclusive<usize>,
) -> bool {
    result.changepoints[session]
        .iter()
        .any(|t| frames.contains(t))
}

#[test]
fn test_injected_change_is_detected() {
    let result = detect(&scenario(), 7);
    assert!(
        has_changepoint_in(&result, "with_change", 48..=52),
        "{:?}",
        result.changepoints
    );
    assert!(
        !has_changepoint_in(&result, "without_change", 45..=55),
        "{:?}",
        result.changepoints
    );
}

#[test]
fn test_shared_changes_are_detected_in_both_sessions() {
    let result = detect(&scenario(), 7);
    for session in ["with_change", "without_change"] {
        assert!(has_changepoint_in(&result, session, 18..=22));
        assert!(has_changepoint_in(&result, session, 78..=82));
    }
}

#[test]
fn test_scores_are_finite_and_non_negative() {
    let result = detect(&scenario(), 11);
    for scores in result.change_scores.values() {
        assert_eq!(scores.len(), FRAMES as usize);
        assert!(scores.iter().all(|s| s.is_finite() && *s >= 0.0));
    }
    assert!(result.threshold.is_finite());
}

#[test]
fn test_same_seed_gives_identical_results() {
    let sessions = scenario();
    assert_eq!(detect(&sessions, 3), detect(&sessions, 3));
}

#[test]
fn test_rigid_motion_does_not_change_changepoints() {
    let sessions = scenario();
    let moved = sessions
        .iter()
        .map(|(name, trajectory)| {
            let moved = trajectory.map_points(|p| {
                let mut q = rotate_xy(p, 0.7);
                q[0] += 12.5;
                q[1] -= 3.0;
                q
            });
            (name.clone(), moved)
        })
        .collect::<SessionMap<_>>();

    let original = detect(&sessions, 5);
    let transformed = detect(&moved, 5);
    assert_eq!(original.changepoints, transformed.changepoints);
    assert_relative_eq!(original.threshold, transformed.threshold, epsilon = 1e-6);
    for (name, scores) in &original.change_scores {
        for (a, b) in scores.iter().zip(&transformed.change_scores[name]) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_changepoints_only_at_valid_frames() {
    let mut sessions = scenario();
    let mask = (0..FRAMES as usize)
        .map(|t| !(60..70).contains(&t))
        .collect::<Vec<_>>();
    if let Some(trajectory) = sessions.get_mut("with_change") {
        trajectory.mask = Some(mask.clone());
    }

    let result = detect(&sessions, 9);
    assert!(has_changepoint_in(&result, "with_change", 48..=52));
    assert!(
        result.changepoints["with_change"]
            .iter()
            .all(|&t| mask[t])
    );
}

#[test]
fn test_derivatives_are_zscored_per_feature() {
    let result = detect(&scenario(), 1);
    let derivatives = &result.zscored_derivatives["with_change"];
    for keypoint in 0..3 {
        for axis in 0..2 {
            let series = derivatives
                .iter()
                .map(|frame| frame[keypoint][axis])
                .collect::<Vec<_>>();
            let mean = series.iter().sum::<f64>() / f64::from(FRAMES);
            assert_relative_eq!(mean, 0.0, epsilon = 1e-6);
        }
    }
}
