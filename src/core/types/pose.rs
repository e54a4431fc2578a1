//! Planar pose type.

use serde::{Deserialize, Serialize};

use crate::core::math::normalize_angle;

/// Rigid SE(2) transform: translation (x, y) in meters and heading in radians.
///
/// Used both as an absolute keyframe pose and as the relative measurement
/// carried by a graph edge. Heading is kept in [-π, π].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians, normalized to [-π, π]
    pub theta: f32,
}

impl Pose2D {
    /// Create a new pose with theta normalized to [-π, π].
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    /// The identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Compose two transforms: `self ⊕ other`.
    ///
    /// `other` is expressed in the frame of `self`.
    /// ```text
    /// C.x = A.x + B.x * cos(A.θ) - B.y * sin(A.θ)
    /// C.y = A.y + B.x * sin(A.θ) + B.y * cos(A.θ)
    /// C.θ = normalize(A.θ + B.θ)
    /// ```
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse transform, so that `p.compose(&p.inverse())` is the identity.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Pose of `other` expressed in the frame of `self`: `self⁻¹ ⊕ other`.
    #[inline]
    pub fn between(&self, other: &Pose2D) -> Pose2D {
        self.inverse().compose(other)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
