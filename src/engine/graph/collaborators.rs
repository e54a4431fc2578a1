//! Optimizer back ends the graph talks to.
//!
//! The graph owns topology and relative measurements only. Numerical
//! optimization lives behind two narrow traits:
//!
//! - [`IncrementalOptimizer`]: fed keyframe by keyframe and observation by
//!   observation as the graph grows
//! - [`GlobalGraphOptimizer`]: handed a full [`GraphSnapshot`] once a loop has
//!   been closed, returns refined global poses

use serde::{Deserialize, Serialize};

use super::pose_graph::{EdgeKind, KeyframeId, PoseGraph};
use super::spanning_tree::SpanningTree;
use crate::config::OptimizerConfig;
use crate::core::types::{Information2D, Pose2D};

/// Relative-pose observation of a feature made from a keyframe.
///
/// Keyframe-to-keyframe constraints are expressed as observations of a
/// landmark standing in for the observed keyframe (same id, identity offset).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyframeObservation {
    /// Observed feature (landmark) id.
    pub feature_id: u64,

    /// Feature pose in the observer frame.
    pub pose: Pose2D,

    /// Information matrix of the measurement.
    pub information: Information2D,

    /// Whether the feature position is known and must not move.
    pub is_fixed: bool,
}

/// Result of defining a keyframe in the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyframeInfo {
    /// Id the optimizer assigned.
    pub id: KeyframeId,
}

/// An edge the optimizer decided to create for its own problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEdgeInfo {
    /// Lower-id endpoint.
    pub from: KeyframeId,
    /// Higher-id endpoint.
    pub to: KeyframeId,
    /// Type of edge.
    pub kind: EdgeKind,
}

/// Incremental relative-bundle-adjustment back end.
pub trait IncrementalOptimizer {
    /// Apply settings. Called once when the solver is created.
    fn configure(&mut self, _config: &OptimizerConfig) {}

    /// Register a new keyframe with its initial observations.
    fn define_new_keyframe(
        &mut self,
        id: KeyframeId,
        observations: &[KeyframeObservation],
        run_local_optimization: bool,
    ) -> KeyframeInfo;

    /// Edges the optimizer would create for `observations` made from `id`.
    fn determine_edges_to_create(
        &mut self,
        _id: KeyframeId,
        _observations: &[KeyframeObservation],
    ) -> Vec<NewEdgeInfo> {
        Vec::new()
    }

    /// Add an observation made from keyframe `id`.
    fn add_observation(&mut self, id: KeyframeId, observation: &KeyframeObservation);
}

/// Optimizer that accepts everything and does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOptimizer;

impl IncrementalOptimizer for NullOptimizer {
    fn define_new_keyframe(
        &mut self,
        id: KeyframeId,
        _observations: &[KeyframeObservation],
        _run_local_optimization: bool,
    ) -> KeyframeInfo {
        KeyframeInfo { id }
    }

    fn add_observation(&mut self, _id: KeyframeId, _observation: &KeyframeObservation) {}
}

/// Keyframe with its initial global pose guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: KeyframeId,
    pub pose: Pose2D,
}

/// Relative constraint as seen by the global optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub from: KeyframeId,
    pub to: KeyframeId,
    pub measurement: Pose2D,
    pub information: Information2D,
    pub kind: EdgeKind,
}

/// Whole graph, with initial guesses, handed to a [`GlobalGraphOptimizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Frame the poses are expressed in.
    pub frame_id: String,

    /// Keyframes reachable from the tree root.
    pub nodes: Vec<SnapshotNode>,

    /// Stored edges whose endpoints are both in `nodes`.
    pub edges: Vec<SnapshotEdge>,
}

impl GraphSnapshot {
    /// Capture `graph`, taking initial poses from `tree`.
    ///
    /// Keyframes outside the tree have no initial guess and are left out,
    /// along with every edge touching them, so each edge refers to a node of
    /// the snapshot.
    pub fn capture(frame_id: &str, graph: &PoseGraph, tree: &SpanningTree) -> Self {
        let nodes = tree
            .iter()
            .map(|n| SnapshotNode {
                id: n.id,
                pose: n.pose,
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .filter(|e| tree.contains(e.from) && tree.contains(e.to))
            .map(|e| SnapshotEdge {
                from: e.from,
                to: e.to,
                measurement: e.measurement,
                information: e.information,
                kind: e.kind,
            })
            .collect();

        Self {
            frame_id: frame_id.to_string(),
            nodes,
            edges,
        }
    }
}

/// Batch optimizer run over the whole graph after a loop closure.
pub trait GlobalGraphOptimizer {
    /// Optimize and return refined global poses.
    fn optimize(&mut self, snapshot: &GraphSnapshot) -> Vec<(KeyframeId, Pose2D)>;
}
