//! Spanning-tree global pose resolution.
//!
//! Keyframes only carry relative constraints, so a global pose exists only
//! with respect to a chosen root. A breadth-first spanning tree gives every
//! reachable keyframe exactly one path to the root, and composing the edge
//! measurements along that path yields its pose:
//!
//! ```text
//! pose(root)  = identity
//! pose(child) = pose(parent) ⊕ z(parent → child)
//! ```
//!
//! where `z(parent → child)` is the edge measurement, inverted when the edge
//! is walked against its canonical direction. Where several edges could
//! discover the same keyframe, the first one in BFS order wins; no weighting
//! by information is done here.

use std::collections::HashMap;

use serde::Serialize;

use super::pose_graph::{EdgeId, KeyframeId, PoseGraph, RelativeEdge};
use super::traversal::{GraphVisitor, TopoDistance, bfs_visit};
use crate::core::types::Pose2D;

/// One keyframe in a [`SpanningTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    /// Keyframe identifier.
    pub id: KeyframeId,

    /// Global pose relative to the tree root.
    pub pose: Pose2D,

    /// Discovering keyframe, `None` for the root.
    pub parent: Option<KeyframeId>,

    /// Edge walked from the parent, `None` for the root.
    pub edge: Option<EdgeId>,

    /// Hop count from the root.
    pub depth: TopoDistance,
}

/// Global pose estimates for every keyframe reachable from a root.
///
/// Nodes are kept in discovery order, root first.
#[derive(Debug, Clone, Default)]
pub struct SpanningTree {
    nodes: Vec<TreeNode>,
    index: HashMap<KeyframeId, usize>,
}

impl SpanningTree {
    fn push(&mut self, node: TreeNode) {
        self.index.insert(node.id, self.nodes.len());
        self.nodes.push(node);
    }

    /// Root keyframe, `None` for an empty tree.
    pub fn root(&self) -> Option<KeyframeId> {
        self.nodes.first().map(|n| n.id)
    }

    /// Number of keyframes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if resolution found nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` was reached.
    pub fn contains(&self, id: KeyframeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Tree node for `id`.
    pub fn get(&self, id: KeyframeId) -> Option<&TreeNode> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Global pose of `id` relative to the root.
    pub fn pose(&self, id: KeyframeId) -> Option<Pose2D> {
        self.get(id).map(|n| n.pose)
    }

    /// Pose of `b` in the frame of `a`, both taken from this tree.
    pub fn relative_pose(&self, a: KeyframeId, b: KeyframeId) -> Option<Pose2D> {
        Some(self.pose(a)?.between(&self.pose(b)?))
    }

    /// Nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes.iter()
    }

    /// Keyframe ids in discovery order.
    pub fn ids(&self) -> Vec<KeyframeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Keyframes from `id` up to and including the root.
    pub fn path_to_root(&self, id: KeyframeId) -> Vec<KeyframeId> {
        let mut path = Vec::new();
        let mut cursor = self.get(id);
        while let Some(node) = cursor {
            path.push(node.id);
            cursor = node.parent.and_then(|p| self.get(p));
        }
        path
    }

    /// Flatten into `(id, pose)` pairs in discovery order.
    pub fn to_corrections(&self) -> Vec<(KeyframeId, Pose2D)> {
        self.nodes.iter().map(|n| (n.id, n.pose)).collect()
    }
}

/// Builds the tree from the traversal's discovery edges.
#[derive(Default)]
struct TreeBuilder {
    tree: SpanningTree,
}

impl GraphVisitor for TreeBuilder {
    fn visit_keyframe(&mut self, keyframe: KeyframeId, dist: TopoDistance) {
        // Non-root keyframes were already added by `visit_k2k`.
        if dist == 0 {
            self.tree.push(TreeNode {
                id: keyframe,
                pose: Pose2D::identity(),
                parent: None,
                edge: None,
                depth: 0,
            });
        }
    }

    fn visit_k2k(
        &mut self,
        current: KeyframeId,
        next: KeyframeId,
        edge: &RelativeEdge,
        dist: TopoDistance,
    ) {
        let (Some(parent_pose), Some(step)) =
            (self.tree.pose(current), edge.measurement_from(current))
        else {
            return;
        };
        self.tree.push(TreeNode {
            id: next,
            pose: parent_pose.compose(&step),
            parent: Some(current),
            edge: Some(edge.id),
            depth: dist,
        });
    }
}

/// Resolve global poses by spanning tree from `root`.
///
/// `max_depth` bounds the hop count (`None` for unbounded). An empty graph or
/// an unknown root yields an empty tree; keyframes beyond the bound or
/// disconnected from the root are simply absent.
pub fn resolve(
    graph: &PoseGraph,
    root: KeyframeId,
    max_depth: Option<TopoDistance>,
) -> SpanningTree {
    if !graph.contains_keyframe(root) {
        log::debug!("Spanning tree requested for unknown root {}", root);
        return SpanningTree::default();
    }

    let mut builder = TreeBuilder::default();
    bfs_visit(graph, root, max_depth, false, &mut builder);
    builder.tree
}
