//! Relative pose graph store.
//!
//! Keyframes carry no global pose. The graph only records how keyframes are
//! related to each other:
//! - keyframe-to-keyframe edges: relative pose constraints (odometry and loop
//!   closures), stored in canonical lower-id → higher-id direction
//! - landmarks anchored at a base keyframe, and keyframe-to-landmark
//!   observations of them
//!
//! Everything is append-only. Global poses are derived on demand by
//! [`resolve`](super::resolve).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{Information2D, Pose2D};
use crate::error::{Error, Result};

/// Sequential keyframe identifier, starting at 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct KeyframeId(pub u64);

impl KeyframeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequential landmark identifier, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkId(pub u64);

impl fmt::Display for LandmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a keyframe-to-keyframe edge in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub usize);

/// Index of a keyframe-to-landmark observation in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub usize);

/// Type of keyframe-to-keyframe edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Constraint between keyframes that follow each other.
    Odometry,
    /// Constraint closing a loop between non-consecutive keyframes.
    LoopClosure,
}

/// A keyframe node and its adjacency.
#[derive(Debug, Clone)]
pub struct KeyframeNode {
    /// Keyframe identifier.
    pub id: KeyframeId,

    /// Incident keyframe-to-keyframe edges, in insertion order.
    edges: Vec<EdgeId>,

    /// Landmark observations made from this keyframe, in insertion order.
    observations: Vec<ObservationId>,
}

impl KeyframeNode {
    fn new(id: KeyframeId) -> Self {
        Self {
            id,
            edges: Vec::new(),
            observations: Vec::new(),
        }
    }

    /// Incident edges in the order they were added.
    pub fn edge_ids(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Observations made from this keyframe.
    pub fn observation_ids(&self) -> &[ObservationId] {
        &self.observations
    }
}

/// A relative pose constraint between two keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeEdge {
    /// Edge identifier.
    pub id: EdgeId,

    /// Lower-id endpoint.
    pub from: KeyframeId,

    /// Higher-id endpoint.
    pub to: KeyframeId,

    /// Pose of `to` expressed in the frame of `from`.
    pub measurement: Pose2D,

    /// Information matrix (inverse covariance).
    pub information: Information2D,

    /// Type of constraint.
    pub kind: EdgeKind,
}

impl RelativeEdge {
    /// The endpoint opposite to `keyframe`, if `keyframe` is an endpoint.
    pub fn other(&self, keyframe: KeyframeId) -> Option<KeyframeId> {
        if keyframe == self.from {
            Some(self.to)
        } else if keyframe == self.to {
            Some(self.from)
        } else {
            None
        }
    }

    /// Pose of the opposite endpoint expressed in `keyframe`'s frame.
    ///
    /// Walking the edge against its canonical direction yields the inverted
    /// measurement.
    pub fn measurement_from(&self, keyframe: KeyframeId) -> Option<Pose2D> {
        if keyframe == self.from {
            Some(self.measurement)
        } else if keyframe == self.to {
            Some(self.measurement.inverse())
        } else {
            None
        }
    }
}

/// A landmark anchored in the frame of a base keyframe.
///
/// A landmark with an identity offset stands for its base keyframe itself;
/// observing it from another keyframe is a relative pose constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Landmark identifier.
    pub id: LandmarkId,

    /// Keyframe whose frame the offset is expressed in.
    pub base: KeyframeId,

    /// Landmark pose relative to `base`.
    pub offset: Pose2D,
}

/// A keyframe-to-landmark edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkObservation {
    /// Observation identifier.
    pub id: ObservationId,

    /// Observing keyframe.
    pub observer: KeyframeId,

    /// Observed landmark.
    pub landmark: LandmarkId,

    /// Landmark pose measured in the observer frame.
    pub measurement: Pose2D,

    /// Information matrix (inverse covariance).
    pub information: Information2D,
}

/// Put a `source → target` constraint into canonical lower → higher direction.
///
/// Returns `(from, to, measurement)` where `measurement` is the pose of `to`
/// in `from`'s frame.
pub fn canonicalize(
    source: KeyframeId,
    target: KeyframeId,
    relative: Pose2D,
) -> (KeyframeId, KeyframeId, Pose2D) {
    if source <= target {
        (source, target, relative)
    } else {
        (target, source, relative.inverse())
    }
}

/// Append-only relative pose graph.
#[derive(Debug, Default)]
pub struct PoseGraph {
    /// Keyframes, indexed by id.
    keyframes: Vec<KeyframeNode>,

    /// Keyframe-to-keyframe edges, indexed by [`EdgeId`].
    edges: Vec<RelativeEdge>,

    /// Landmarks, indexed by id.
    landmarks: Vec<Landmark>,

    /// Keyframe-to-landmark edges, indexed by [`ObservationId`].
    observations: Vec<LandmarkObservation>,
}

impl PoseGraph {
    /// Create a new empty pose graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next keyframe.
    pub fn add_keyframe(&mut self) -> KeyframeId {
        let id = KeyframeId(self.keyframes.len() as u64);
        self.keyframes.push(KeyframeNode::new(id));
        id
    }

    /// Check that a constraint between `source` and `target` can be stored.
    pub fn validate_constraint(&self, source: KeyframeId, target: KeyframeId) -> Result<()> {
        if source == target {
            return Err(Error::SelfConstraint(source));
        }
        for id in [source, target] {
            if !self.contains_keyframe(id) {
                return Err(Error::UnknownKeyframe(id));
            }
        }
        Ok(())
    }

    /// Store a relative constraint.
    ///
    /// `relative` is the pose of `target` in `source`'s frame, in whichever
    /// order the caller supplied it; it is canonicalized before storage.
    pub fn add_constraint(
        &mut self,
        source: KeyframeId,
        target: KeyframeId,
        relative: Pose2D,
        information: Information2D,
        kind: EdgeKind,
    ) -> Result<EdgeId> {
        self.validate_constraint(source, target)?;

        let (from, to, measurement) = canonicalize(source, target, relative);
        let id = EdgeId(self.edges.len());
        self.edges.push(RelativeEdge {
            id,
            from,
            to,
            measurement,
            information,
            kind,
        });
        self.keyframes[from.index()].edges.push(id);
        self.keyframes[to.index()].edges.push(id);
        Ok(id)
    }

    /// Anchor a new landmark in the frame of `base`.
    pub fn add_landmark(&mut self, base: KeyframeId, offset: Pose2D) -> Result<LandmarkId> {
        if !self.contains_keyframe(base) {
            return Err(Error::UnknownKeyframe(base));
        }
        let id = LandmarkId(self.landmarks.len() as u64);
        self.landmarks.push(Landmark { id, base, offset });
        Ok(id)
    }

    /// Record an observation of `landmark` from `observer`.
    pub fn add_landmark_observation(
        &mut self,
        observer: KeyframeId,
        landmark: LandmarkId,
        measurement: Pose2D,
        information: Information2D,
    ) -> Result<ObservationId> {
        if !self.contains_keyframe(observer) {
            return Err(Error::UnknownKeyframe(observer));
        }
        if self.landmark(landmark).is_none() {
            return Err(Error::UnknownLandmark(landmark));
        }
        let id = ObservationId(self.observations.len());
        self.observations.push(LandmarkObservation {
            id,
            observer,
            landmark,
            measurement,
            information,
        });
        self.keyframes[observer.index()].observations.push(id);
        Ok(id)
    }

    /// Whether `id` has been allocated.
    pub fn contains_keyframe(&self, id: KeyframeId) -> bool {
        id.index() < self.keyframes.len()
    }

    /// Get a keyframe node by id.
    pub fn keyframe(&self, id: KeyframeId) -> Option<&KeyframeNode> {
        self.keyframes.get(id.index())
    }

    /// All keyframes in creation order.
    pub fn keyframes(&self) -> &[KeyframeNode] {
        &self.keyframes
    }

    /// First keyframe, if any.
    pub fn first_keyframe(&self) -> Option<KeyframeId> {
        self.keyframes.first().map(|k| k.id)
    }

    /// Most recently created keyframe, if any.
    pub fn latest_keyframe(&self) -> Option<KeyframeId> {
        self.keyframes.last().map(|k| k.id)
    }

    /// Get an edge by id.
    pub fn edge(&self, id: EdgeId) -> Option<&RelativeEdge> {
        self.edges.get(id.0)
    }

    /// All keyframe-to-keyframe edges in insertion order.
    pub fn edges(&self) -> &[RelativeEdge] {
        &self.edges
    }

    /// Edges incident to `keyframe`, in insertion order.
    pub fn edges_of(&self, keyframe: KeyframeId) -> impl Iterator<Item = &RelativeEdge> + '_ {
        self.keyframe(keyframe)
            .into_iter()
            .flat_map(|node| node.edges.iter())
            .map(|id| &self.edges[id.0])
    }

    /// Get a landmark by id.
    pub fn landmark(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(id.0 as usize)
    }

    /// All landmarks.
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// All keyframe-to-landmark observations in insertion order.
    pub fn observations(&self) -> &[LandmarkObservation] {
        &self.observations
    }

    /// Observations made from `keyframe`, in insertion order.
    pub fn observations_of(
        &self,
        keyframe: KeyframeId,
    ) -> impl Iterator<Item = &LandmarkObservation> + '_ {
        self.keyframe(keyframe)
            .into_iter()
            .flat_map(|node| node.observations.iter())
            .map(|id| &self.observations[id.0])
    }

    /// Number of keyframes.
    pub fn num_keyframes(&self) -> usize {
        self.keyframes.len()
    }

    /// Number of keyframe-to-keyframe edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of loop closure edges.
    pub fn num_loop_closures(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::LoopClosure)
            .count()
    }

    /// Number of landmarks.
    pub fn num_landmarks(&self) -> usize {
        self.landmarks.len()
    }

    /// True when no keyframe exists yet.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn graph_with(n: usize) -> PoseGraph {
        let mut graph = PoseGraph::new();
        for _ in 0..n {
            graph.add_keyframe();
        }
        graph
    }

    #[test]
    fn test_keyframe_ids_are_sequential() {
        let mut graph = PoseGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.add_keyframe(), KeyframeId(0));
        assert_eq!(graph.add_keyframe(), KeyframeId(1));
        assert_eq!(graph.add_keyframe(), KeyframeId(2));
        assert_eq!(graph.num_keyframes(), 3);
        assert_eq!(graph.first_keyframe(), Some(KeyframeId(0)));
        assert_eq!(graph.latest_keyframe(), Some(KeyframeId(2)));
    }

    #[test]
    fn test_forward_constraint_stored_as_given() {
        let mut graph = graph_with(2);
        let t = Pose2D::new(1.0, 0.5, 0.2);
        let id = graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(1),
                t,
                Information2D::identity(),
                EdgeKind::Odometry,
            )
            .unwrap();

        let edge = graph.edge(id).unwrap();
        assert_eq!(edge.from, KeyframeId(0));
        assert_eq!(edge.to, KeyframeId(1));
        assert_eq!(edge.measurement, t);
    }

    #[test]
    fn test_backward_constraint_is_inverted() {
        let mut graph = graph_with(2);
        let t = Pose2D::new(1.0, 0.5, 0.2);
        let id = graph
            .add_constraint(
                KeyframeId(1),
                KeyframeId(0),
                t,
                Information2D::identity(),
                EdgeKind::Odometry,
            )
            .unwrap();

        let edge = graph.edge(id).unwrap();
        assert_eq!(edge.from, KeyframeId(0));
        assert_eq!(edge.to, KeyframeId(1));
        let expected = t.inverse();
        assert_relative_eq!(edge.measurement.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(edge.measurement.y, expected.y, epsilon = 1e-6);
        assert_relative_eq!(edge.measurement.theta, expected.theta, epsilon = 1e-6);
    }

    #[test]
    fn test_measurement_from_either_endpoint() {
        let mut graph = graph_with(3);
        let t = Pose2D::new(2.0, 0.0, 0.5);
        let id = graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(2),
                t,
                Information2D::identity(),
                EdgeKind::LoopClosure,
            )
            .unwrap();
        let edge = graph.edge(id).unwrap();

        assert_eq!(edge.measurement_from(KeyframeId(0)), Some(t));
        assert_eq!(edge.measurement_from(KeyframeId(2)), Some(t.inverse()));
        assert_eq!(edge.measurement_from(KeyframeId(1)), None);
        assert_eq!(edge.other(KeyframeId(2)), Some(KeyframeId(0)));
        assert_eq!(edge.other(KeyframeId(1)), None);
    }

    #[test]
    fn test_parallel_edges_are_distinct() {
        let mut graph = graph_with(2);
        let info = Information2D::identity();
        let a = graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(1),
                Pose2D::new(1.0, 0.0, 0.0),
                info,
                EdgeKind::Odometry,
            )
            .unwrap();
        let b = graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(1),
                Pose2D::new(1.1, 0.0, 0.0),
                info,
                EdgeKind::LoopClosure,
            )
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(graph.num_edges(), 2);
        assert_eq!(graph.num_loop_closures(), 1);
        assert_eq!(graph.edges_of(KeyframeId(0)).count(), 2);
        assert_eq!(graph.edges_of(KeyframeId(1)).count(), 2);
    }

    #[test]
    fn test_adjacency_keeps_insertion_order() {
        let mut graph = graph_with(4);
        let info = Information2D::identity();
        graph
            .add_constraint(
                KeyframeId(1),
                KeyframeId(3),
                Pose2D::identity(),
                info,
                EdgeKind::LoopClosure,
            )
            .unwrap();
        graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(1),
                Pose2D::identity(),
                info,
                EdgeKind::Odometry,
            )
            .unwrap();
        graph
            .add_constraint(
                KeyframeId(1),
                KeyframeId(2),
                Pose2D::identity(),
                info,
                EdgeKind::Odometry,
            )
            .unwrap();

        let neighbours: Vec<_> = graph
            .edges_of(KeyframeId(1))
            .filter_map(|e| e.other(KeyframeId(1)))
            .collect();
        assert_eq!(neighbours, vec![KeyframeId(3), KeyframeId(0), KeyframeId(2)]);
    }

    #[test]
    fn test_invalid_constraints_leave_graph_untouched() {
        let mut graph = graph_with(2);
        let info = Information2D::identity();

        let err = graph
            .add_constraint(
                KeyframeId(1),
                KeyframeId(1),
                Pose2D::identity(),
                info,
                EdgeKind::Odometry,
            )
            .unwrap_err();
        assert!(matches!(err, Error::SelfConstraint(KeyframeId(1))));

        let err = graph
            .add_constraint(
                KeyframeId(0),
                KeyframeId(7),
                Pose2D::identity(),
                info,
                EdgeKind::Odometry,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownKeyframe(KeyframeId(7))));

        assert_eq!(graph.num_edges(), 0);
        assert!(graph.keyframe(KeyframeId(0)).unwrap().edge_ids().is_empty());
    }

    #[test]
    fn test_landmarks_and_observations() {
        let mut graph = graph_with(2);
        let lm = graph.add_landmark(KeyframeId(0), Pose2D::identity()).unwrap();
        assert_eq!(lm, LandmarkId(0));

        let obs = graph
            .add_landmark_observation(
                KeyframeId(1),
                lm,
                Pose2D::new(-1.0, 0.0, 0.0),
                Information2D::identity(),
            )
            .unwrap();
        assert_eq!(obs, ObservationId(0));
        assert_eq!(graph.observations_of(KeyframeId(1)).count(), 1);
        assert_eq!(graph.observations_of(KeyframeId(0)).count(), 0);

        assert!(matches!(
            graph.add_landmark(KeyframeId(5), Pose2D::identity()),
            Err(Error::UnknownKeyframe(KeyframeId(5)))
        ));
        assert!(matches!(
            graph.add_landmark_observation(
                KeyframeId(0),
                LandmarkId(9),
                Pose2D::identity(),
                Information2D::identity(),
            ),
            Err(Error::UnknownLandmark(LandmarkId(9)))
        ));
    }

    #[test]
    fn test_canonicalize() {
        let t = Pose2D::new(0.3, -0.2, 1.0);
        let (from, to, m) = canonicalize(KeyframeId(2), KeyframeId(5), t);
        assert_eq!((from, to, m), (KeyframeId(2), KeyframeId(5), t));

        let (from, to, m) = canonicalize(KeyframeId(5), KeyframeId(2), t);
        assert_eq!((from, to), (KeyframeId(2), KeyframeId(5)));
        assert_eq!(m, t.inverse());
    }
}
