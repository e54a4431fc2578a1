//! Bounded-depth breadth-first traversal of the pose graph.
//!
//! The traversal walks keyframe-to-keyframe edges in both directions and,
//! optionally, keyframe-to-landmark observations. What gets expanded and what
//! happens on each visit is decided by a [`GraphVisitor`].
//!
//! ```text
//!   depth 0        depth 1        depth 2
//!   [root] ──k2k── [KF a] ──k2k── [KF c]
//!     │              └──k2f── (LM x)
//!     └────k2k──── [KF b]
//! ```
//!
//! Keyframes at `max_depth` are visited but not expanded.

use std::collections::VecDeque;

use super::pose_graph::{KeyframeId, LandmarkId, LandmarkObservation, PoseGraph, RelativeEdge};

/// Hop count along graph edges from the traversal root.
pub type TopoDistance = usize;

/// Hooks called during [`bfs_visit`].
///
/// Every filter defaults to `true`: without overrides the traversal visits
/// everything within the depth bound.
pub trait GraphVisitor {
    /// Whether `keyframe`, reached at `dist`, should be visited and expanded.
    fn filter_keyframe(&mut self, _keyframe: KeyframeId, _dist: TopoDistance) -> bool {
        true
    }

    /// Called once per visited keyframe, root included.
    fn visit_keyframe(&mut self, _keyframe: KeyframeId, _dist: TopoDistance) {}

    /// Whether `landmark`, reached at `dist`, should be visited.
    fn filter_landmark(&mut self, _landmark: LandmarkId, _dist: TopoDistance) -> bool {
        true
    }

    /// Called once per visited landmark.
    fn visit_landmark(&mut self, _landmark: LandmarkId, _dist: TopoDistance) {}

    /// Whether to walk `edge` from `current` to the not-yet-visited `next`.
    fn filter_k2k(
        &mut self,
        _current: KeyframeId,
        _next: KeyframeId,
        _edge: &RelativeEdge,
        _dist: TopoDistance,
    ) -> bool {
        true
    }

    /// Called for every edge that discovers a new keyframe, before that
    /// keyframe's [`visit_keyframe`](Self::visit_keyframe).
    fn visit_k2k(
        &mut self,
        _current: KeyframeId,
        _next: KeyframeId,
        _edge: &RelativeEdge,
        _dist: TopoDistance,
    ) {
    }

    /// Whether to follow `observation` out of `current`.
    fn filter_k2f(
        &mut self,
        _current: KeyframeId,
        _observation: &LandmarkObservation,
        _dist: TopoDistance,
    ) -> bool {
        true
    }

    /// Called for every followed observation, visited landmark or not.
    fn visit_k2f(
        &mut self,
        _current: KeyframeId,
        _observation: &LandmarkObservation,
        _dist: TopoDistance,
    ) {
    }
}

/// Breadth-first traversal from `root`, at most `max_depth` hops deep.
///
/// `None` leaves the depth unbounded. Landmarks are only reached when
/// `include_landmarks` is set; they are leaves one hop beyond their observer.
///
/// Returns the number of keyframes visited: zero when `root` does not exist
/// or is rejected by the visitor.
pub fn bfs_visit<V>(
    graph: &PoseGraph,
    root: KeyframeId,
    max_depth: Option<TopoDistance>,
    include_landmarks: bool,
    visitor: &mut V,
) -> usize
where
    V: GraphVisitor + ?Sized,
{
    if !graph.contains_keyframe(root) || !visitor.filter_keyframe(root, 0) {
        return 0;
    }

    let mut kf_seen = vec![false; graph.num_keyframes()];
    let mut lm_seen = vec![false; graph.num_landmarks()];
    let mut queue = VecDeque::new();

    kf_seen[root.0 as usize] = true;
    visitor.visit_keyframe(root, 0);
    queue.push_back((root, 0));
    let mut visited = 1;

    while let Some((current, dist)) = queue.pop_front() {
        if max_depth.is_some_and(|max| dist >= max) {
            continue;
        }
        let next_dist = dist + 1;

        for edge in graph.edges_of(current) {
            let Some(next) = edge.other(current) else {
                continue;
            };
            if kf_seen[next.0 as usize] {
                continue;
            }
            if !visitor.filter_k2k(current, next, edge, next_dist)
                || !visitor.filter_keyframe(next, next_dist)
            {
                continue;
            }

            kf_seen[next.0 as usize] = true;
            visitor.visit_k2k(current, next, edge, next_dist);
            visitor.visit_keyframe(next, next_dist);
            queue.push_back((next, next_dist));
            visited += 1;
        }

        if !include_landmarks {
            continue;
        }

        for observation in graph.observations_of(current) {
            if !visitor.filter_k2f(current, observation, next_dist) {
                continue;
            }
            visitor.visit_k2f(current, observation, next_dist);

            let idx = observation.landmark.0 as usize;
            if !lm_seen[idx] && visitor.filter_landmark(observation.landmark, next_dist) {
                lm_seen[idx] = true;
                visitor.visit_landmark(observation.landmark, next_dist);
            }
        }
    }

    visited
}

/// Visitor that records visited keyframe ids in traversal order.
#[derive(Debug, Default)]
pub struct KeyframeCollector {
    /// Visited keyframes, in visiting order.
    pub ids: Vec<KeyframeId>,
}

impl GraphVisitor for KeyframeCollector {
    fn visit_keyframe(&mut self, keyframe: KeyframeId, _dist: TopoDistance) {
        self.ids.push(keyframe);
    }
}

/// Keyframes within `max_depth` hops of `root`, in BFS order (root first).
///
/// Empty when `root` does not exist.
pub fn near_linked_keyframes(
    graph: &PoseGraph,
    root: KeyframeId,
    max_depth: Option<TopoDistance>,
) -> Vec<KeyframeId> {
    let mut collector = KeyframeCollector::default();
    bfs_visit(graph, root, max_depth, false, &mut collector);
    collector.ids
}
