//! Solver session behaviour seen from the host side.
//!
//! Run with: `cargo test --test solver_session`

mod common;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use common::{init_logging, solver_from_trajectory, straight_trajectory};
use relative_slam::engine::graph::GraphSnapshot;
use relative_slam::io::visualization::{MarkerAction, MarkerType};
use relative_slam::{
    Covariance2D, Error, GlobalGraphOptimizer, JsonLinesPublisher, KeyframeId, MarkerArray,
    MarkerPublisher, Pose2D, RelativeSolver, SolverConfig,
};

/// Nudges every keyframe along +y so callers can tell the result came from here.
struct ShiftingOptimizer {
    runs: Arc<Mutex<usize>>,
}

impl GlobalGraphOptimizer for ShiftingOptimizer {
    fn optimize(&mut self, snapshot: &GraphSnapshot) -> Vec<(KeyframeId, Pose2D)> {
        *self.runs.lock().unwrap() += 1;
        snapshot
            .nodes
            .iter()
            .map(|n| (n.id, Pose2D::new(n.pose.x, n.pose.y + 0.1, n.pose.theta)))
            .collect()
    }
}

/// Counts published batches.
#[derive(Default)]
struct CountingPublisher {
    batches: Vec<MarkerArray>,
}

impl MarkerPublisher for CountingPublisher {
    fn publish(&mut self, markers: &MarkerArray) -> relative_slam::Result<()> {
        self.batches.push(markers.clone());
        Ok(())
    }
}

/// Apply a batch to receiver-side state keyed by `(namespace, id)`.
fn apply(live: &mut BTreeSet<(String, usize)>, batch: &MarkerArray) {
    for marker in &batch.markers {
        let key = (marker.namespace.clone(), marker.id);
        match marker.action {
            MarkerAction::Add => {
                live.insert(key);
            }
            MarkerAction::Delete => {
                live.remove(&key);
            }
        }
    }
}

/// Keyframes 0..n with no constraints: each projects to a single label.
fn isolated_keyframes(solver: &mut RelativeSolver, n: usize) {
    for _ in 0..n {
        solver.add_node();
    }
}

#[test]
fn test_empty_graph() {
    init_logging();
    let mut solver = RelativeSolver::default();
    assert!(solver.get_corrections().is_empty());
    assert!(solver.active_ids().is_empty());

    let mut markers = MarkerArray::new();
    assert_eq!(solver.publish_graph_visualization(&mut markers), 0);
    assert!(markers.is_empty());

    let mut publisher = CountingPublisher::default();
    assert_eq!(solver.publish_to(&mut publisher).unwrap(), 0);
    assert!(publisher.batches.is_empty());
}

#[test]
fn test_marker_retraction_ten_then_four() {
    init_logging();
    let mut live = BTreeSet::new();
    // From the latest root: one label for the root, arrow and label per
    // other keyframe, one line per edge. A chain of 4 gives 1 + 3 * 2 + 3.
    let mut big = solver_from_trajectory(&straight_trajectory(4, 1.0), SolverConfig::default());
    let mut markers = MarkerArray::new();
    assert_eq!(big.publish_graph_visualization(&mut markers), 10);
    assert_eq!(markers.len(), 10);
    apply(&mut live, &markers);
    assert_eq!(live.len(), 10);

    // A new, separate pair becomes the latest root's whole world:
    // root label, arrow, label, edge.
    big.add_node();
    big.add_node();
    big.add_constraint(
        KeyframeId(4),
        KeyframeId(5),
        Pose2D::new(1.0, 0.0, 0.0),
        &Covariance2D::identity(),
    )
    .unwrap();

    let mut markers = MarkerArray::new();
    assert_eq!(big.publish_graph_visualization(&mut markers), 4);
    let added: Vec<_> = markers.added().map(|m| m.id).collect();
    assert_eq!(added, vec![0, 1, 2, 3]);

    // Ids 4..9 go, and id 3 also loses its arrow now that it is an edge.
    let deleted: Vec<_> = markers
        .deleted()
        .map(|m| (m.namespace.as_str(), m.id))
        .collect();
    assert_eq!(
        deleted,
        vec![
            ("relative_slam", 3),
            ("relative_slam", 4),
            ("relative_slam", 5),
            ("relative_slam", 6),
            ("spanning_tree", 7),
            ("spanning_tree", 8),
            ("spanning_tree", 9),
        ]
    );
    apply(&mut live, &markers);
    assert_eq!(live.len(), 4);
    assert!(live.contains(&("spanning_tree".to_string(), 3)));

    // The next projection has nothing left to retract.
    let mut markers = MarkerArray::new();
    big.publish_graph_visualization(&mut markers);
    assert_eq!(markers.deleted().count(), 0);
}

#[test]
fn test_visualization_bounded_by_depth() {
    init_logging();
    let mut config = SolverConfig::default();
    config.queries.visualization_depth = 1;
    let mut solver = solver_from_trajectory(&straight_trajectory(5, 1.0), config);

    let mut markers = MarkerArray::new();
    solver.publish_graph_visualization(&mut markers);
    // Root 4 and neighbour 3 only: label, arrow, label, edge.
    assert_eq!(markers.len(), 4);
    let labels: Vec<_> = markers
        .markers
        .iter()
        .filter(|m| m.marker_type == MarkerType::TextViewFacing)
        .filter_map(|m| m.text.clone())
        .collect();
    assert_eq!(labels, vec!["4".to_string(), "3".to_string()]);
}

#[test]
fn test_isolated_keyframes_project_labels_only() {
    init_logging();
    let mut solver = RelativeSolver::default();
    isolated_keyframes(&mut solver, 3);

    let mut markers = MarkerArray::new();
    assert_eq!(solver.publish_graph_visualization(&mut markers), 1);
    assert_eq!(markers.markers[0].text.as_deref(), Some("2"));
}

#[test]
fn test_singular_covariance_leaves_graph_unchanged() {
    init_logging();
    let mut solver = solver_from_trajectory(&straight_trajectory(3, 1.0), SolverConfig::default());
    let before = solver.get_corrections().to_vec();

    let singular = Covariance2D::from_array([1.0, 2.0, 0.0, 2.0, 4.0, 0.0, 0.0, 0.0, 1.0]);
    let err = solver
        .add_constraint(KeyframeId(0), KeyframeId(2), Pose2D::new(2.0, 0.0, 0.0), &singular)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::SingularCovariance {
            source_id: KeyframeId(0),
            target_id: KeyframeId(2)
        }
    ));
    assert_eq!(solver.graph().num_edges(), 2);
    assert_eq!(solver.get_corrections(), before.as_slice());
}

#[test]
fn test_clear_keeps_graph_and_resets_markers() {
    init_logging();
    let mut solver = solver_from_trajectory(&straight_trajectory(3, 1.0), SolverConfig::default());
    let before = solver.get_corrections().to_vec();
    let mut markers = MarkerArray::new();
    solver.publish_graph_visualization(&mut markers);

    solver.clear();
    assert!(solver.corrections().is_empty());
    assert_eq!(solver.graph().num_keyframes(), 3);
    assert_eq!(solver.graph().num_edges(), 2);
    assert_eq!(solver.get_corrections(), before.as_slice());
}

#[test]
fn test_loop_closed_gates_global_optimization() {
    init_logging();
    let runs = Arc::new(Mutex::new(0));
    let mut solver = solver_from_trajectory(&straight_trajectory(3, 1.0), SolverConfig::default());
    solver.set_global_optimizer(Box::new(ShiftingOptimizer { runs: runs.clone() }));

    assert!(solver.publish_global_graph().is_none());
    assert_eq!(*runs.lock().unwrap(), 0);

    solver.set_loop_closed();
    let poses = solver.publish_global_graph().unwrap();
    assert_eq!(poses.len(), 3);
    assert_eq!(poses[2].0, KeyframeId(2));
    approx::assert_relative_eq!(poses[2].1.y, 0.1, epsilon = 1e-6);
    assert_eq!(*runs.lock().unwrap(), 1);

    // Flag consumed.
    assert!(solver.publish_global_graph().is_none());
    assert_eq!(*runs.lock().unwrap(), 1);
}

#[test]
fn test_json_lines_publishing() {
    init_logging();
    let mut solver = solver_from_trajectory(&straight_trajectory(2, 1.0), SolverConfig::default());
    let mut publisher = JsonLinesPublisher::new(Vec::new());
    assert_eq!(solver.publish_to(&mut publisher).unwrap(), 4);
    assert_eq!(solver.publish_to(&mut publisher).unwrap(), 4);

    let text = String::from_utf8(publisher.into_inner()).unwrap();
    let batches: Vec<MarkerArray> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0], batches[1]);
    assert!(batches[0].markers.iter().all(|m| m.frame_id == "/relative_map"));
}
