//! Core data types.
//!
//! - [`Pose2D`]: planar rigid transforms
//! - [`Covariance2D`] / [`Information2D`]: measurement uncertainty and its inverse

mod covariance;
mod pose;

pub use covariance::{Covariance2D, Information2D};
pub use pose::Pose2D;
