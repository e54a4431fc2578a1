//! Measurement uncertainty for planar relative poses.
//!
//! A [`Covariance2D`] is what the front end reports alongside a relative pose;
//! the graph stores its inverse as an [`Information2D`].

use serde::{Deserialize, Serialize};

/// Determinant magnitude, relative to the cube of the largest entry, below
/// which a covariance is treated as singular.
const SINGULAR_RELATIVE_TOLERANCE: f64 = 1e-9;

/// 3x3 covariance matrix for (x, y, theta).
///
/// Stored row-major: `[xx, xy, xt, yx, yy, yt, tx, ty, tt]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Covariance2D {
    data: [f32; 9],
}

impl Covariance2D {
    /// Diagonal covariance from variances σ²x, σ²y, σ²θ.
    #[inline]
    pub fn diagonal(xx: f32, yy: f32, tt: f32) -> Self {
        Self {
            data: [xx, 0.0, 0.0, 0.0, yy, 0.0, 0.0, 0.0, tt],
        }
    }

    /// Unit covariance.
    #[inline]
    pub fn identity() -> Self {
        Self::diagonal(1.0, 1.0, 1.0)
    }

    /// Create from a row-major array.
    #[inline]
    pub fn from_array(data: [f32; 9]) -> Self {
        Self { data }
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * 3 + col]
    }

    /// Raw row-major data.
    #[inline]
    pub fn as_array(&self) -> &[f32; 9] {
        &self.data
    }

    fn as_f64(&self) -> [f64; 9] {
        self.data.map(f64::from)
    }

    /// Determinant, computed in double precision.
    pub fn determinant(&self) -> f64 {
        let m = self.as_f64();
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Invert into an information matrix.
    ///
    /// Returns `None` when the matrix is singular (or numerically close to it,
    /// relative to its own scale) or contains non-finite values. The result is
    /// symmetrized from the upper triangle of the inverse.
    pub fn inverse(&self) -> Option<Information2D> {
        let m = self.as_f64();
        if m.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let det = self.determinant();
        if scale == 0.0 || det.abs() <= SINGULAR_RELATIVE_TOLERANCE * scale.powi(3) {
            return None;
        }

        // Adjugate / determinant, upper triangle only.
        let inv_det = 1.0 / det;
        let xx = (m[4] * m[8] - m[5] * m[7]) * inv_det;
        let xy = (m[2] * m[7] - m[1] * m[8]) * inv_det;
        let xt = (m[1] * m[5] - m[2] * m[4]) * inv_det;
        let yy = (m[0] * m[8] - m[2] * m[6]) * inv_det;
        let yt = (m[2] * m[3] - m[0] * m[5]) * inv_det;
        let tt = (m[0] * m[4] - m[1] * m[3]) * inv_det;

        Some(Information2D {
            xx: xx as f32,
            xy: xy as f32,
            xt: xt as f32,
            yy: yy as f32,
            yt: yt as f32,
            tt: tt as f32,
        })
    }
}

impl Default for Covariance2D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Information matrix (inverse covariance) for a 2D pose measurement.
///
/// Symmetric, so only the upper triangle is kept:
/// ```text
/// | xx  xy  xt |
/// | xy  yy  yt |
/// | xt  yt  tt |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Information2D {
    /// Information for x-x
    pub xx: f32,
    /// Information for x-y
    pub xy: f32,
    /// Information for x-theta
    pub xt: f32,
    /// Information for y-y
    pub yy: f32,
    /// Information for y-theta
    pub yt: f32,
    /// Information for theta-theta
    pub tt: f32,
}

impl Information2D {
    /// Diagonal information matrix.
    pub fn diagonal(xx: f32, yy: f32, tt: f32) -> Self {
        Self {
            xx,
            xy: 0.0,
            xt: 0.0,
            yy,
            yt: 0.0,
            tt,
        }
    }

    /// Unit information.
    pub fn identity() -> Self {
        Self::diagonal(1.0, 1.0, 1.0)
    }

    /// Expand to a full row-major 3x3 matrix.
    pub fn to_matrix(&self) -> [[f32; 3]; 3] {
        [
            [self.xx, self.xy, self.xt],
            [self.xy, self.yy, self.yt],
            [self.xt, self.yt, self.tt],
        ]
    }
}

impl Default for Information2D {
    fn default() -> Self {
        Self::identity()
    }
}
