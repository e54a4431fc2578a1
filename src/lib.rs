//! relative-slam - Relative pose graph SLAM back end
//!
//! Keyframes are linked by relative SE(2) constraints only. Global poses are
//! never stored; they are recovered on demand by composing measurements
//! along a breadth-first spanning tree from a chosen root.
//!
//! # Architecture
//!
//! The crate is organized into 3 layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      bin/                           │  ← Replay tool
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Infrastructure
//! │            (visualization, replay)                  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │     (pose graph, traversal, spanning tree, solver)  │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │           (Pose2D, covariance, math)                │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use relative_slam::{Covariance2D, KeyframeId, Pose2D, RelativeSolver};
//!
//! let mut solver = RelativeSolver::default();
//! let a = solver.add_node();
//! let b = solver.add_node();
//! solver
//!     .add_constraint(a, b, Pose2D::new(1.0, 0.0, 0.0), &Covariance2D::identity())
//!     .unwrap();
//!
//! let corrections = solver.get_corrections();
//! assert_eq!(corrections[1].0, KeyframeId(1));
//! assert_eq!(corrections[1].1, Pose2D::new(1.0, 0.0, 0.0));
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod io;

pub use config::{
    CorrectionRoot, EdgeCreationPolicy, NoiseModel, OptimizerConfig, QueryConfig, SolverAlgorithm,
    SolverConfig, VisualizationConfig,
};
pub use crate::core::types::{Covariance2D, Information2D, Pose2D};
pub use engine::graph::{
    EdgeId, EdgeKind, GlobalGraphOptimizer, GraphSnapshot, GraphVisitor, IncrementalOptimizer,
    KeyframeId, LandmarkId, PoseGraph, SpanningTree, TopoDistance, bfs_visit,
    near_linked_keyframes, resolve,
};
pub use engine::solver::RelativeSolver;
pub use error::{Error, Result};
pub use io::visualization::{GraphVisualizer, JsonLinesPublisher, MarkerArray, MarkerPublisher};
