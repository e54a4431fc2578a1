//! Test utilities for relative-slam integration tests.
//!
//! Builders for solvers fed from synthetic trajectories.

#![allow(dead_code)]

use std::f32::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use relative_slam::{Covariance2D, KeyframeId, Pose2D, RelativeSolver, SolverConfig};

/// Initialise logging once per test binary.
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Ground-truth straight-line trajectory.
pub fn straight_trajectory(n: usize, spacing: f32) -> Vec<Pose2D> {
    (0..n)
        .map(|i| Pose2D::new(i as f32 * spacing, 0.0, 0.0))
        .collect()
}

/// Ground-truth closed square, turning left at each corner.
pub fn square_trajectory(side: f32) -> Vec<Pose2D> {
    vec![
        Pose2D::new(0.0, 0.0, 0.0),
        Pose2D::new(side, 0.0, FRAC_PI_2),
        Pose2D::new(side, side, std::f32::consts::PI),
        Pose2D::new(0.0, side, -FRAC_PI_2),
    ]
}

/// Solver with one keyframe per pose and odometry between consecutive poses.
pub fn solver_from_trajectory(poses: &[Pose2D], config: SolverConfig) -> RelativeSolver {
    let mut solver = RelativeSolver::new(config);
    for _ in poses {
        solver.add_node();
    }
    for (i, pair) in poses.windows(2).enumerate() {
        solver
            .add_constraint(
                KeyframeId(i as u64),
                KeyframeId(i as u64 + 1),
                pair[0].between(&pair[1]),
                &Covariance2D::identity(),
            )
            .expect("odometry constraint");
    }
    solver
}

/// Compare two poses within `eps`.
pub fn assert_pose_eq(actual: Pose2D, expected: Pose2D, eps: f32) {
    assert_relative_eq!(actual.x, expected.x, epsilon = eps);
    assert_relative_eq!(actual.y, expected.y, epsilon = eps);
    let dtheta = relative_slam::core::math::angle_diff(expected.theta, actual.theta);
    assert!(
        dtheta.abs() < eps,
        "heading {} != {} (diff {})",
        actual.theta,
        expected.theta,
        dtheta
    );
}
