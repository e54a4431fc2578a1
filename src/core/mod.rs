//! Core foundation layer.
//!
//! Bottom of the stack with no internal dependencies.
//!
//! - [`types`]: poses, covariance and information matrices
//! - [`math`]: angle arithmetic

pub mod math;
pub mod types;
