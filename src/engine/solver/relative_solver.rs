//! Host-facing relative SLAM solver.
//!
//! Owns the relative pose graph and drives the optimizer collaborators.
//! Global poses are never stored: every query resolves a fresh spanning tree.
//!
//! # Clear semantics
//!
//! [`RelativeSolver::clear`] drops the corrections snapshot and the
//! visualization retraction state only. Keyframes and constraints survive,
//! so the next [`get_corrections`](RelativeSolver::get_corrections) returns
//! the same poses as before the clear.

use crate::config::{CorrectionRoot, SolverConfig};
use crate::core::types::{Covariance2D, Pose2D};
use crate::engine::graph::{
    EdgeId, GlobalGraphOptimizer, GraphSnapshot, IncrementalOptimizer, KeyframeId,
    KeyframeObservation, LandmarkId, NullOptimizer, ObservationId, PoseGraph, SpanningTree,
    TopoDistance, canonicalize, near_linked_keyframes, resolve,
};
use crate::error::{Error, Result};
use crate::io::visualization::{GraphVisualizer, MarkerArray, MarkerPublisher};

/// Incremental relative pose graph solver.
pub struct RelativeSolver {
    config: SolverConfig,
    graph: PoseGraph,
    optimizer: Box<dyn IncrementalOptimizer + Send>,
    global_optimizer: Option<Box<dyn GlobalGraphOptimizer + Send>>,
    visualizer: GraphVisualizer,
    corrections: Vec<(KeyframeId, Pose2D)>,
    loop_closed: bool,
}

impl RelativeSolver {
    /// Create a solver without an optimizer back end.
    pub fn new(config: SolverConfig) -> Self {
        Self::with_optimizer(config, Box::new(NullOptimizer))
    }

    /// Create a solver feeding `optimizer`.
    pub fn with_optimizer(
        config: SolverConfig,
        mut optimizer: Box<dyn IncrementalOptimizer + Send>,
    ) -> Self {
        optimizer.configure(&config.optimizer);
        let visualizer = GraphVisualizer::new(config.visualization.clone());
        log::info!(
            "Relative solver: {:?} edges, {:?}, tree depth {}",
            config.optimizer.edge_creation,
            config.optimizer.solver,
            config.optimizer.max_tree_depth
        );

        Self {
            config,
            graph: PoseGraph::new(),
            optimizer,
            global_optimizer: None,
            visualizer,
            corrections: Vec::new(),
            loop_closed: false,
        }
    }

    /// Attach the optimizer used by [`publish_global_graph`](Self::publish_global_graph).
    pub fn set_global_optimizer(&mut self, optimizer: Box<dyn GlobalGraphOptimizer + Send>) {
        self.global_optimizer = Some(optimizer);
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn graph(&self) -> &PoseGraph {
        &self.graph
    }

    /// Create the next keyframe.
    ///
    /// The keyframe is registered with the optimizer together with a fixed
    /// observation of itself, so later constraints can refer to it as a
    /// feature.
    pub fn add_node(&mut self) -> KeyframeId {
        let id = self.graph.add_keyframe();
        let self_observation = KeyframeObservation {
            feature_id: id.0,
            pose: Pose2D::identity(),
            information: Default::default(),
            is_fixed: true,
        };

        let info = self.optimizer.define_new_keyframe(
            id,
            std::slice::from_ref(&self_observation),
            self.config.optimizer.run_local_optimization,
        );
        if info.id != id {
            log::warn!("Optimizer assigned keyframe {} to graph keyframe {}", info.id, id);
        }

        log::info!("Added node {}", id);
        id
    }

    /// Add a relative pose constraint.
    ///
    /// `relative` is the pose of `target` in the frame of `source`. On error
    /// nothing is stored and the optimizer is not called.
    pub fn add_constraint(
        &mut self,
        source: KeyframeId,
        target: KeyframeId,
        relative: Pose2D,
        covariance: &Covariance2D,
    ) -> Result<EdgeId> {
        let measured = covariance.inverse().ok_or(Error::SingularCovariance {
            source_id: source,
            target_id: target,
        })?;
        self.graph.validate_constraint(source, target)?;

        let information = self.config.optimizer.noise_model.information_for(measured);
        let (from, to, measurement) = canonicalize(source, target, relative);
        let kind = self.config.optimizer.edge_creation.classify(from, to);
        let edge = self
            .graph
            .add_constraint(from, to, measurement, information, kind)?;

        // The higher keyframe observes the lower one's stand-in landmark.
        let observation = KeyframeObservation {
            feature_id: from.0,
            pose: measurement.inverse(),
            information,
            is_fixed: false,
        };
        let new_edges = self
            .optimizer
            .determine_edges_to_create(to, std::slice::from_ref(&observation));
        if !new_edges.is_empty() {
            log::debug!("Optimizer creates {} edges for {} -> {}", new_edges.len(), from, to);
        }
        self.optimizer.add_observation(to, &observation);

        log::debug!("Added {:?} constraint {} -> {}", kind, from, to);
        Ok(edge)
    }

    /// Anchor a landmark in the frame of `base`.
    pub fn add_landmark(&mut self, base: KeyframeId, offset: Pose2D) -> Result<LandmarkId> {
        self.graph.add_landmark(base, offset)
    }

    /// Record an observation of `landmark` from `observer`.
    pub fn observe_landmark(
        &mut self,
        observer: KeyframeId,
        landmark: LandmarkId,
        relative: Pose2D,
        covariance: &Covariance2D,
    ) -> Result<ObservationId> {
        let base = self
            .graph
            .landmark(landmark)
            .map(|lm| lm.base)
            .ok_or(Error::UnknownLandmark(landmark))?;
        let measured = covariance.inverse().ok_or(Error::SingularCovariance {
            source_id: observer,
            target_id: base,
        })?;
        let information = self.config.optimizer.noise_model.information_for(measured);
        self.graph
            .add_landmark_observation(observer, landmark, relative, information)
    }

    /// Resolve a spanning tree from `root`.
    pub fn resolve(&self, root: KeyframeId, max_depth: Option<TopoDistance>) -> SpanningTree {
        resolve(&self.graph, root, max_depth)
    }

    fn correction_root(&self) -> Option<KeyframeId> {
        match self.config.queries.correction_root {
            CorrectionRoot::First => self.graph.first_keyframe(),
            CorrectionRoot::Latest => self.graph.latest_keyframe(),
        }
    }

    /// Rebuild the corrections snapshot.
    pub fn compute(&mut self) {
        self.corrections.clear();
        let Some(root) = self.correction_root() else {
            return;
        };
        self.corrections = resolve(&self.graph, root, None).to_corrections();
        log::debug!("Computed {} corrections from root {}", self.corrections.len(), root);
    }

    /// Recompute and return global poses in traversal order.
    pub fn get_corrections(&mut self) -> &[(KeyframeId, Pose2D)] {
        self.compute();
        &self.corrections
    }

    /// Last computed snapshot, without recomputing.
    pub fn corrections(&self) -> &[(KeyframeId, Pose2D)] {
        &self.corrections
    }

    /// Keyframes within the active window of the latest keyframe.
    pub fn active_ids(&self) -> Vec<KeyframeId> {
        match self.graph.latest_keyframe() {
            Some(root) => near_linked_keyframes(
                &self.graph,
                root,
                Some(self.config.queries.active_window_depth),
            ),
            None => Vec::new(),
        }
    }

    /// Keyframes within `max_depth` hops of `keyframe`, in BFS order.
    pub fn near_linked_objects(
        &self,
        keyframe: KeyframeId,
        max_depth: TopoDistance,
    ) -> Vec<KeyframeId> {
        near_linked_keyframes(&self.graph, keyframe, Some(max_depth))
    }

    /// Signal that a loop has been closed.
    pub fn set_loop_closed(&mut self) {
        self.loop_closed = true;
    }

    pub fn is_loop_closed(&self) -> bool {
        self.loop_closed
    }

    /// Run the global optimizer if a loop was closed since the last run.
    ///
    /// Returns `None` when there is nothing to do. The flag is only cleared
    /// once the optimizer has actually run.
    pub fn publish_global_graph(&mut self) -> Option<Vec<(KeyframeId, Pose2D)>> {
        if !self.loop_closed {
            return None;
        }
        let Some(optimizer) = self.global_optimizer.as_mut() else {
            log::debug!("Loop closed but no global optimizer attached");
            return None;
        };
        let root = self.graph.first_keyframe()?;

        let tree = resolve(&self.graph, root, None);
        let snapshot =
            GraphSnapshot::capture(&self.config.visualization.global_map_frame, &self.graph, &tree);
        log::info!(
            "Global optimization over {} keyframes, {} edges",
            snapshot.nodes.len(),
            snapshot.edges.len()
        );

        let poses = optimizer.optimize(&snapshot);
        self.loop_closed = false;
        Some(poses)
    }

    /// Append graph markers, drawn around the latest keyframe, to `out`.
    ///
    /// Returns the number of add markers.
    pub fn publish_graph_visualization(&mut self, out: &mut MarkerArray) -> usize {
        let Some(root) = self.graph.latest_keyframe() else {
            log::info!("Graph is empty, nothing to visualize");
            return 0;
        };
        let tree = resolve(
            &self.graph,
            root,
            Some(self.config.queries.visualization_depth),
        );
        self.visualizer.project(&self.graph, &tree, out)
    }

    /// Project the graph and hand the batch to `publisher`.
    pub fn publish_to(&mut self, publisher: &mut dyn MarkerPublisher) -> Result<usize> {
        let mut markers = MarkerArray::new();
        let added = self.publish_graph_visualization(&mut markers);
        if !markers.is_empty() {
            publisher.publish(&markers)?;
        }
        Ok(added)
    }

    /// Drop the corrections snapshot and the visualization state.
    ///
    /// The graph is kept.
    pub fn clear(&mut self) {
        self.corrections.clear();
        self.visualizer.reset();
        log::info!("Cleared corrections ({} keyframes kept)", self.graph.num_keyframes());
    }
}

impl Default for RelativeSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}
