//! Projection of a resolved spanning tree into markers.
//!
//! Marker ids are reused from 0 on every projection. The receiver keys markers
//! by `(namespace, id)`, so every pair emitted by the previous projection that
//! the current one does not emit again gets an explicit delete marker in its
//! old namespace. That covers ids past the new count as well as ids that moved
//! between the keyframe and edge namespaces.
//!
//! Emission order:
//! 1. per tree keyframe (discovery order): an arrow unless it is the root,
//!    then its id label
//! 2. keyframe-to-keyframe edges with both endpoints in the tree, in storage
//!    order
//! 3. keyframe-to-landmark observations whose landmark base is another tree
//!    keyframe
//! 4. deletes for stale `(namespace, id)` pairs, ascending by id

use crate::config::VisualizationConfig;
use crate::engine::graph::{EdgeKind, PoseGraph, SpanningTree};

use super::markers::{
    ColorRgba, Marker, MarkerAction, MarkerArray, MarkerPose, MarkerType, Vector3,
};

/// Stateful graph-to-marker projector.
#[derive(Debug, Clone)]
pub struct GraphVisualizer {
    style: VisualizationConfig,
    /// Namespace of each id added by the last non-empty projection.
    previous_namespaces: Vec<String>,
}

impl GraphVisualizer {
    pub fn new(style: VisualizationConfig) -> Self {
        Self {
            style,
            previous_namespaces: Vec::new(),
        }
    }

    pub fn style(&self) -> &VisualizationConfig {
        &self.style
    }

    /// Number of markers added by the last non-empty projection.
    pub fn previous_marker_count(&self) -> usize {
        self.previous_namespaces.len()
    }

    /// Forget previously emitted markers.
    pub fn reset(&mut self) {
        self.previous_namespaces.clear();
    }

    /// Append markers for `tree` to `out`.
    ///
    /// Returns the number of add markers. An empty tree emits nothing and
    /// leaves the retraction state alone.
    pub fn project(
        &mut self,
        graph: &PoseGraph,
        tree: &SpanningTree,
        out: &mut MarkerArray,
    ) -> usize {
        let Some(root) = tree.root() else {
            log::info!("Graph is empty, nothing to visualize");
            return 0;
        };

        let first = out.len();
        let mut next_id = 0;

        for node in tree.iter() {
            if node.id != root {
                out.push(self.keyframe_arrow(next_id, node.pose.into()));
                next_id += 1;
            }
            let label_pose = MarkerPose {
                position: Vector3::new(
                    node.pose.x + self.style.text_offset,
                    node.pose.y + self.style.text_offset,
                    0.0,
                ),
                yaw: 0.0,
            };
            out.push(self.label(next_id, label_pose, node.id.to_string()));
            next_id += 1;
        }

        for edge in graph.edges() {
            let (Some(a), Some(b)) = (tree.pose(edge.from), tree.pose(edge.to)) else {
                continue;
            };
            let color = match edge.kind {
                EdgeKind::Odometry => ColorRgba::BLUE,
                EdgeKind::LoopClosure => ColorRgba::PURPLE,
            };
            out.push(self.line(
                next_id,
                &self.style.edge_namespace,
                Vector3::from_pose(&a),
                Vector3::from_pose(&b),
                color,
            ));
            next_id += 1;
        }

        for node in tree.iter() {
            for observation in graph.observations_of(node.id) {
                let Some(landmark) = graph.landmark(observation.landmark) else {
                    continue;
                };
                if landmark.base == node.id {
                    continue;
                }
                let Some(base_pose) = tree.pose(landmark.base) else {
                    continue;
                };
                let target = base_pose.compose(&landmark.offset);
                out.push(self.line(
                    next_id,
                    &self.style.namespace,
                    Vector3::from_pose(&node.pose),
                    Vector3::from_pose(&target),
                    ColorRgba::GREEN,
                ));
                next_id += 1;
            }
        }

        let current: Vec<String> = out.markers[first..]
            .iter()
            .map(|m| m.namespace.clone())
            .collect();
        let previous = std::mem::replace(&mut self.previous_namespaces, current);

        let mut retracted = 0;
        for (id, namespace) in previous.iter().enumerate() {
            if self.previous_namespaces.get(id) == Some(namespace) {
                continue;
            }
            out.push(Marker::new(
                &self.style.relative_map_frame,
                namespace,
                id,
                MarkerType::Sphere,
                MarkerAction::Delete,
            ));
            retracted += 1;
        }
        if retracted > 0 {
            log::debug!("Retracted {retracted} stale markers");
        }

        next_id
    }

    fn keyframe_arrow(&self, id: usize, pose: MarkerPose) -> Marker {
        let s = self.style.node_scale;
        Marker::new(
            &self.style.relative_map_frame,
            &self.style.namespace,
            id,
            MarkerType::Arrow,
            MarkerAction::Add,
        )
        .with_pose(pose)
        .with_scale(Vector3::new(s, s * 0.3, s * 0.3))
        .with_color(ColorRgba::RED)
    }

    fn label(&self, id: usize, pose: MarkerPose, text: String) -> Marker {
        Marker::new(
            &self.style.relative_map_frame,
            &self.style.namespace,
            id,
            MarkerType::TextViewFacing,
            MarkerAction::Add,
        )
        .with_pose(pose)
        .with_scale(Vector3::new(0.0, 0.0, self.style.text_scale))
        .with_color(ColorRgba::WHITE)
        .with_text(text)
    }

    fn line(&self, id: usize, namespace: &str, a: Vector3, b: Vector3, color: ColorRgba) -> Marker {
        Marker::new(
            &self.style.relative_map_frame,
            namespace,
            id,
            MarkerType::LineStrip,
            MarkerAction::Add,
        )
        .with_scale(Vector3::splat(self.style.edge_width))
        .with_color(color)
        .with_points(vec![a, b])
    }
}
