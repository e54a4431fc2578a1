//! Solver configuration.
//!
//! Loaded from a single TOML file; every field has a default, so an empty
//! file (or no file at all) gives the stock setup.
//!
//! ```toml
//! [optimizer]
//! max_tree_depth = 3
//! max_optimize_depth = 3
//! solver = "lm_schur_dense_cholesky"
//!
//! [optimizer.edge_creation]
//! type = "linear"
//!
//! [optimizer.noise_model]
//! type = "per_observation"
//!
//! [queries]
//! active_window_depth = 30
//! visualization_depth = 100
//! correction_root = "first"
//!
//! [visualization]
//! relative_map_frame = "/relative_map"
//! global_map_frame = "/global_map"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Information2D;
use crate::engine::graph::{EdgeKind, KeyframeId};
use crate::error::Result;

/// How keyframe-to-keyframe constraints are classified as they are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeCreationPolicy {
    /// A linear chain: only constraints between consecutive keyframes are
    /// odometry, everything else closes a loop.
    #[default]
    Linear,

    /// Keyframes are grouped into fixed-size local areas; constraints inside
    /// an area (or between consecutive keyframes) are odometry.
    LocalAreasFixedSize {
        /// Keyframes per local area.
        submap_size: u64,
    },
}

impl EdgeCreationPolicy {
    /// Classify a canonical `from < to` constraint.
    pub fn classify(&self, from: KeyframeId, to: KeyframeId) -> EdgeKind {
        let (lo, hi) = if from <= to { (from.0, to.0) } else { (to.0, from.0) };
        let consecutive = hi - lo == 1;
        let same_area = match *self {
            EdgeCreationPolicy::Linear => false,
            EdgeCreationPolicy::LocalAreasFixedSize { submap_size } => {
                let size = submap_size.max(1);
                lo / size == hi / size
            }
        };

        if consecutive || same_area {
            EdgeKind::Odometry
        } else {
            EdgeKind::LoopClosure
        }
    }
}

/// Which information matrix is attached to a new constraint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoiseModel {
    /// Inverse of the covariance supplied with each constraint.
    #[default]
    PerObservation,

    /// The same matrix for every observation.
    Constant {
        /// Information matrix shared by all observations.
        information: Information2D,
    },
}

impl NoiseModel {
    /// Information to store, given the inverse of the measured covariance.
    pub fn information_for(&self, measured: Information2D) -> Information2D {
        match self {
            NoiseModel::PerObservation => measured,
            NoiseModel::Constant { information } => *information,
        }
    }
}

/// Numerical back end requested from the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverAlgorithm {
    /// Levenberg-Marquardt, Schur complement, dense Cholesky.
    #[default]
    LmSchurDenseCholesky,
    /// Levenberg-Marquardt, Schur complement, sparse Cholesky.
    LmSchurSparseCholesky,
    /// Levenberg-Marquardt, sparse Cholesky without Schur complement.
    LmNoSchurSparseCholesky,
}

/// Root used when flattening the graph into corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionRoot {
    /// Keyframe 0.
    #[default]
    First,
    /// Most recently added keyframe.
    Latest,
}

/// Settings handed to the optimizer collaborator at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Requested numerical solver.
    #[serde(default)]
    pub solver: SolverAlgorithm,

    /// Depth of the spanning trees maintained by the optimizer.
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,

    /// Depth of the local optimization window.
    #[serde(default = "default_max_optimize_depth")]
    pub max_optimize_depth: usize,

    /// Observations needed before a distant keyframe is linked.
    #[serde(default = "default_min_obs_to_loop_closure")]
    pub min_obs_to_loop_closure: usize,

    /// Robust (Huber-style) kernel on residuals.
    #[serde(default)]
    pub use_robust_kernel: bool,

    /// Run local optimization when a keyframe is defined.
    #[serde(default = "default_run_local_optimization")]
    pub run_local_optimization: bool,

    /// 0: none, 1: important only, 2: verbose.
    #[serde(default)]
    pub verbosity: u8,

    /// Constraint classification strategy.
    #[serde(default)]
    pub edge_creation: EdgeCreationPolicy,

    /// Observation noise strategy.
    #[serde(default)]
    pub noise_model: NoiseModel,
}

fn default_max_tree_depth() -> usize {
    3
}

fn default_max_optimize_depth() -> usize {
    3
}

fn default_min_obs_to_loop_closure() -> usize {
    1
}

fn default_run_local_optimization() -> bool {
    true
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            edge_creation: EdgeCreationPolicy::default(),
            noise_model: NoiseModel::default(),
            solver: SolverAlgorithm::default(),
            max_tree_depth: default_max_tree_depth(),
            max_optimize_depth: default_max_optimize_depth(),
            min_obs_to_loop_closure: default_min_obs_to_loop_closure(),
            use_robust_kernel: false,
            run_local_optimization: default_run_local_optimization(),
            verbosity: 0,
        }
    }
}

/// Topological bounds for host queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Depth of the active keyframe window around the latest keyframe.
    pub active_window_depth: usize,

    /// Depth of the tree drawn by the visualization.
    pub visualization_depth: usize,

    /// Root for corrections.
    pub correction_root: CorrectionRoot,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            active_window_depth: 30,
            visualization_depth: 100,
            correction_root: CorrectionRoot::First,
        }
    }
}

/// Marker styling and frame names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Frame of markers drawn from relative spanning trees.
    pub relative_map_frame: String,

    /// Frame of global-optimization snapshots.
    pub global_map_frame: String,

    /// Namespace of keyframe, label and observation markers.
    pub namespace: String,

    /// Namespace of keyframe-to-keyframe edge markers.
    pub edge_namespace: String,

    /// Keyframe arrow length in meters.
    pub node_scale: f32,

    /// Line width of edge markers in meters.
    pub edge_width: f32,

    /// Text height of keyframe labels in meters.
    pub text_scale: f32,

    /// Label offset from its keyframe along x and y, in meters.
    pub text_offset: f32,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            relative_map_frame: "/relative_map".to_string(),
            global_map_frame: "/global_map".to_string(),
            namespace: "relative_slam".to_string(),
            edge_namespace: "spanning_tree".to_string(),
            node_scale: 0.15,
            edge_width: 0.1,
            text_scale: 0.3,
            text_offset: 0.15,
        }
    }
}

/// Top-level solver configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Optimizer collaborator settings.
    #[serde(default)]
    pub optimizer: OptimizerConfig,

    /// Query depth bounds.
    #[serde(default)]
    pub queries: QueryConfig,

    /// Visualization styling.
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl SolverConfig {
    /// Load from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load from `path` if given, falling back to defaults on any failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load config {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}
