//! Relative SLAM engine layer.
//!
//! # Contents
//!
//! - [`graph`]: relative pose graph, bounded traversal, spanning-tree resolution
//! - [`solver`]: host-facing solver built on the graph

pub mod graph;
pub mod solver;
