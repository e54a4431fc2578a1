//! Error types for relative-slam.

use crate::engine::graph::{KeyframeId, LandmarkId};

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported to the caller of a single operation.
///
/// None of these are fatal to the solver: the graph is left exactly as it
/// was before the failing call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The covariance supplied with a constraint cannot be inverted
    #[error("singular covariance for constraint {source_id} -> {target_id}")]
    SingularCovariance {
        /// Source keyframe of the rejected constraint
        source_id: KeyframeId,
        /// Target keyframe of the rejected constraint
        target_id: KeyframeId,
    },

    /// A keyframe id that was never created
    #[error("unknown keyframe {0}")]
    UnknownKeyframe(KeyframeId),

    /// A landmark id that was never created
    #[error("unknown landmark {0}")]
    UnknownLandmark(LandmarkId),

    /// A constraint from a keyframe to itself
    #[error("constraint from keyframe {0} to itself")]
    SelfConstraint(KeyframeId),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
