//! Marker message types.
//!
//! A small, transport-agnostic rendition of a visualization marker: enough to
//! draw keyframes, labels and edges, serializable as JSON.

use serde::{Deserialize, Serialize};

use crate::core::types::Pose2D;

/// Shape of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    Sphere,
    Arrow,
    LineStrip,
    TextViewFacing,
}

/// What the receiver should do with a marker id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerAction {
    /// Create or replace the marker.
    Add,
    /// Remove a previously added marker.
    Delete,
}

/// RGBA color, components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub const RED: ColorRgba = ColorRgba::opaque(1.0, 0.0, 0.0);
    pub const GREEN: ColorRgba = ColorRgba::opaque(0.0, 1.0, 0.0);
    pub const BLUE: ColorRgba = ColorRgba::opaque(0.0, 0.0, 1.0);
    pub const PURPLE: ColorRgba = ColorRgba::opaque(1.0, 0.0, 1.0);
    pub const WHITE: ColorRgba = ColorRgba::opaque(1.0, 1.0, 1.0);

    /// Fully opaque color.
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// 3D vector, used for positions, line points and scales.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same value on all three axes.
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Point on the ground plane under `pose`.
    pub fn from_pose(pose: &Pose2D) -> Self {
        Self::new(pose.x, pose.y, 0.0)
    }
}

/// Planar marker pose: a position and a heading about z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerPose {
    pub position: Vector3,
    pub yaw: f32,
}

impl From<Pose2D> for MarkerPose {
    fn from(pose: Pose2D) -> Self {
        Self {
            position: Vector3::from_pose(&pose),
            yaw: pose.theta,
        }
    }
}

/// A single visualization marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Frame the marker is expressed in.
    pub frame_id: String,

    /// Namespace; `(namespace, id)` identifies a marker at the receiver.
    pub namespace: String,

    /// Identifier, dense from 0 within one projection.
    pub id: usize,

    #[serde(rename = "type")]
    pub marker_type: MarkerType,

    pub action: MarkerAction,

    pub pose: MarkerPose,

    pub scale: Vector3,

    pub color: ColorRgba,

    /// Line vertices, for [`MarkerType::LineStrip`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Vector3>,

    /// Label, for [`MarkerType::TextViewFacing`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Marker {
    /// Marker with identity pose, no points and no text.
    pub fn new(
        frame_id: &str,
        namespace: &str,
        id: usize,
        marker_type: MarkerType,
        action: MarkerAction,
    ) -> Self {
        Self {
            frame_id: frame_id.to_string(),
            namespace: namespace.to_string(),
            id,
            marker_type,
            action,
            pose: MarkerPose::default(),
            scale: Vector3::splat(1.0),
            color: ColorRgba::WHITE,
            points: Vec::new(),
            text: None,
        }
    }

    pub fn with_pose(mut self, pose: MarkerPose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color(mut self, color: ColorRgba) -> Self {
        self.color = color;
        self
    }

    pub fn with_points(mut self, points: Vec<Vector3>) -> Self {
        self.points = points;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Batch of markers published together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkerArray {
    pub markers: Vec<Marker>,
}

impl MarkerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Markers with [`MarkerAction::Add`].
    pub fn added(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.markers.iter().filter(|m| m.action == MarkerAction::Add)
    }

    /// Markers with [`MarkerAction::Delete`].
    pub fn deleted(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.markers
            .iter()
            .filter(|m| m.action == MarkerAction::Delete)
    }
}
