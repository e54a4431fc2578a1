//! Replay scripts.
//!
//! A script is a JSON-lines file, one [`ReplayCommand`] per line. Blank lines
//! and lines starting with `#` are skipped.
//!
//! ```text
//! {"command": "add_node"}
//! {"command": "add_node"}
//! {"command": "add_constraint", "source": 0, "target": 1, "pose": {"x": 1.0, "y": 0.0, "theta": 0.0}}
//! {"command": "corrections"}
//! ```

use std::io::BufRead;

use serde::{Deserialize, Serialize};

use crate::core::types::{Covariance2D, Pose2D};
use crate::engine::graph::{EdgeId, KeyframeId, LandmarkId, ObservationId};
use crate::engine::solver::RelativeSolver;
use crate::error::Result;
use crate::io::visualization::MarkerArray;

/// One scripted solver call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ReplayCommand {
    /// Create the next keyframe.
    AddNode,

    /// Relative constraint; `pose` is `target` in the frame of `source`.
    AddConstraint {
        source: KeyframeId,
        target: KeyframeId,
        pose: Pose2D,
        /// Identity when omitted.
        #[serde(default)]
        covariance: Covariance2D,
    },

    /// Anchor a landmark at `base`.
    AddLandmark {
        base: KeyframeId,
        #[serde(default)]
        offset: Pose2D,
    },

    /// Observe a landmark from `observer`.
    ObserveLandmark {
        observer: KeyframeId,
        landmark: LandmarkId,
        pose: Pose2D,
        #[serde(default)]
        covariance: Covariance2D,
    },

    /// Signal a closed loop.
    LoopClosed,

    /// Print global poses.
    Corrections,

    /// Print the active keyframe window.
    ActiveIds,

    /// Print keyframes near `keyframe`.
    NearLinked {
        keyframe: KeyframeId,
        max_depth: usize,
    },

    /// Print visualization markers.
    Visualize,

    /// Run global optimization if a loop was closed.
    GlobalGraph,

    /// Drop corrections and visualization state.
    Clear,
}

/// Result of one [`ReplayCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum ReplayOutput {
    Node { id: KeyframeId },
    Edge { id: EdgeId },
    Landmark { id: LandmarkId },
    Observation { id: ObservationId },
    Corrections { poses: Vec<(KeyframeId, Pose2D)> },
    Ids { ids: Vec<KeyframeId> },
    Markers { markers: MarkerArray },
    GlobalPoses { poses: Vec<(KeyframeId, Pose2D)> },
}

impl ReplayCommand {
    /// Run against `solver`. Commands with nothing to report return `None`.
    pub fn apply(&self, solver: &mut RelativeSolver) -> Result<Option<ReplayOutput>> {
        let output = match self {
            ReplayCommand::AddNode => Some(ReplayOutput::Node {
                id: solver.add_node(),
            }),
            ReplayCommand::AddConstraint {
                source,
                target,
                pose,
                covariance,
            } => Some(ReplayOutput::Edge {
                id: solver.add_constraint(*source, *target, *pose, covariance)?,
            }),
            ReplayCommand::AddLandmark { base, offset } => Some(ReplayOutput::Landmark {
                id: solver.add_landmark(*base, *offset)?,
            }),
            ReplayCommand::ObserveLandmark {
                observer,
                landmark,
                pose,
                covariance,
            } => Some(ReplayOutput::Observation {
                id: solver.observe_landmark(*observer, *landmark, *pose, covariance)?,
            }),
            ReplayCommand::LoopClosed => {
                solver.set_loop_closed();
                None
            }
            ReplayCommand::Corrections => Some(ReplayOutput::Corrections {
                poses: solver.get_corrections().to_vec(),
            }),
            ReplayCommand::ActiveIds => Some(ReplayOutput::Ids {
                ids: solver.active_ids(),
            }),
            ReplayCommand::NearLinked {
                keyframe,
                max_depth,
            } => Some(ReplayOutput::Ids {
                ids: solver.near_linked_objects(*keyframe, *max_depth),
            }),
            ReplayCommand::Visualize => {
                let mut markers = MarkerArray::new();
                solver.publish_graph_visualization(&mut markers);
                Some(ReplayOutput::Markers { markers })
            }
            ReplayCommand::GlobalGraph => solver
                .publish_global_graph()
                .map(|poses| ReplayOutput::GlobalPoses { poses }),
            ReplayCommand::Clear => {
                solver.clear();
                None
            }
        };
        Ok(output)
    }
}

/// Parse a JSON-lines script.
pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<ReplayCommand>> {
    let mut commands = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        commands.push(serde_json::from_str(line)?);
    }
    Ok(commands)
}
