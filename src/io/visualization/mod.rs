//! Graph visualization.
//!
//! - [`markers`]: marker message types
//! - [`GraphVisualizer`]: spanning tree → markers, with stale-marker retraction
//! - [`MarkerPublisher`]: where marker batches go

pub mod markers;
mod projector;
mod publisher;

pub use markers::{ColorRgba, Marker, MarkerAction, MarkerArray, MarkerPose, MarkerType, Vector3};
pub use projector::GraphVisualizer;
pub use publisher::{JsonLinesPublisher, MarkerPublisher};
