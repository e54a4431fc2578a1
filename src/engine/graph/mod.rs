//! Relative pose graph and its spanning-tree resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  RELATIVE POSE GRAPH                         │
//! │                                                              │
//! │    Nodes: keyframes, no global pose stored                   │
//! │                                                              │
//! │    Edges: relative constraints, lower id → higher id         │
//! │           - Odometry edges                                   │
//! │           - Loop closure edges                               │
//! │                                                              │
//! │    [K0] ──odom──▶ [K1] ──odom──▶ [K2] ──odom──▶ [K3]        │
//! │     │                              ▲                         │
//! │     └────────── loop closure ──────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  bounded BFS from a root
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SPANNING TREE                             │
//! │                                                              │
//! │    pose(root)  = identity                                    │
//! │    pose(child) = pose(parent) ⊕ z(parent → child)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`PoseGraph`]: keyframes, relative edges, landmarks and observations
//! - [`bfs_visit`] / [`GraphVisitor`]: depth-bounded traversal with hooks
//! - [`resolve`] / [`SpanningTree`]: global poses relative to a root
//! - [`IncrementalOptimizer`] / [`GlobalGraphOptimizer`]: optimizer back ends
//!
//! # Example
//!
//! ```
//! use relative_slam::core::types::{Information2D, Pose2D};
//! use relative_slam::engine::graph::{EdgeKind, PoseGraph, resolve};
//!
//! let mut graph = PoseGraph::new();
//! let k0 = graph.add_keyframe();
//! let k1 = graph.add_keyframe();
//! let step = Pose2D::new(1.0, 0.0, 0.0);
//! graph
//!     .add_constraint(k0, k1, step, Information2D::identity(), EdgeKind::Odometry)
//!     .unwrap();
//!
//! let tree = resolve(&graph, k0, None);
//! assert_eq!(tree.pose(k1), Some(Pose2D::new(1.0, 0.0, 0.0)));
//! ```

mod collaborators;
mod pose_graph;
mod spanning_tree;
mod traversal;

pub use collaborators::{
    GlobalGraphOptimizer, GraphSnapshot, IncrementalOptimizer, KeyframeInfo, KeyframeObservation,
    NewEdgeInfo, NullOptimizer, SnapshotEdge, SnapshotNode,
};
pub use pose_graph::{
    EdgeId, EdgeKind, KeyframeId, KeyframeNode, Landmark, LandmarkId, LandmarkObservation,
    ObservationId, PoseGraph, RelativeEdge, canonicalize,
};
pub use spanning_tree::{SpanningTree, TreeNode, resolve};
pub use traversal::{
    GraphVisitor, KeyframeCollector, TopoDistance, bfs_visit, near_linked_keyframes,
};
