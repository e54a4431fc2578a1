//! Angle arithmetic for planar poses.

use std::f32::consts::{PI, TAU};

/// Wrap an angle into [-π, π].
///
/// ```
/// use relative_slam::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
/// assert!((normalize_angle(-2.5 * PI) + 0.5 * PI).abs() < 1e-5);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Signed shortest rotation that takes heading `from` onto heading `to`.
#[inline]
pub fn angle_diff(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_keeps_in_range_values() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(1.0), 1.0);
        assert_relative_eq!(normalize_angle(-1.0), -1.0);
        assert_relative_eq!(normalize_angle(PI), PI);
    }

    #[test]
    fn test_normalize_wraps_full_turns() {
        assert_relative_eq!(normalize_angle(TAU), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(TAU + 0.25), 0.25, epsilon = 1e-5);
        assert_relative_eq!(normalize_angle(-TAU - 0.25), -0.25, epsilon = 1e-5);
    }

    #[test]
    fn test_normalize_just_past_pi_flips_sign() {
        let wrapped = normalize_angle(PI + 0.01);
        assert!(wrapped < 0.0);
        assert_relative_eq!(wrapped, -PI + 0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_diff_takes_short_way_round() {
        assert_relative_eq!(angle_diff(0.0, 0.5), 0.5);
        assert_relative_eq!(angle_diff(0.5, 0.0), -0.5);
        assert_relative_eq!(angle_diff(PI - 0.05, -PI + 0.05), 0.1, epsilon = 1e-5);
    }
}
