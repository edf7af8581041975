//! Visualization primitives emitted by the publishers.
//!
//! A marker is identified by `(namespace, id)`. Re-emitting a marker with
//! the same identity replaces the previous one in the viewer instead of
//! adding a duplicate.

use nalgebra::Vector3;

use crate::geometry::SE3;

/// Camera frustum per frame.
pub const NS_CAMERA: &str = "cam_pose_vis";
/// Position point per frame.
pub const NS_POINT: &str = "cam_pose_pt";
/// Sequence-index label per frame.
pub const NS_TEXT: &str = "cam_pose_txt";
/// Line between the two frames of a loop candidate.
pub const NS_LOOP: &str = "loopcandidates_line";

/// Stable identity of a logical entity across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId {
    pub ns: &'static str,
    pub id: u64,
}

impl MarkerId {
    pub fn new(ns: &'static str, id: u64) -> Self {
        Self { ns, id }
    }
}

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.ns, self.id)
    }
}

/// Primitive class of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Point,
    Camera,
    Text,
    Line,
}

/// Geometry payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point {
        position: Vector3<f64>,
        radius: f32,
    },
    Camera {
        pose: SE3,
        scale: f32,
    },
    Text {
        position: Vector3<f64>,
        text: String,
        height: f32,
    },
    Line {
        from: Vector3<f64>,
        to: Vector3<f64>,
        width: f32,
    },
}

/// One drawable unit sent to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub color: [u8; 3],
    pub shape: Shape,
}

impl Marker {
    pub fn kind(&self) -> MarkerKind {
        match self.shape {
            Shape::Point { .. } => MarkerKind::Point,
            Shape::Camera { .. } => MarkerKind::Camera,
            Shape::Text { .. } => MarkerKind::Text,
            Shape::Line { .. } => MarkerKind::Line,
        }
    }

    /// Text payload for text markers.
    pub fn text(&self) -> Option<&str> {
        match &self.shape {
            Shape::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Liveness signal emitted once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub tick: u64,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_kind_follows_shape() {
        let m = Marker {
            id: MarkerId::new(NS_TEXT, 3),
            color: [255, 255, 255],
            shape: Shape::Text {
                position: Vector3::zeros(),
                text: "3;".to_string(),
                height: 0.03,
            },
        };
        assert_eq!(m.kind(), MarkerKind::Text);
        assert_eq!(m.text(), Some("3;"));
        assert_eq!(m.id.to_string(), "cam_pose_txt/3");
    }

    #[test]
    fn test_namespaces_separate_identities() {
        assert_ne!(MarkerId::new(NS_POINT, 1), MarkerId::new(NS_TEXT, 1));
        assert_eq!(MarkerId::new(NS_POINT, 1), MarkerId::new(NS_POINT, 1));
    }
}
