//! Board nodes.

use super::{Color, NodeId, next_seed, normalize_degrees};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a node displays. Only [`NodeKind::Frame`] and [`NodeKind::Pin`]
/// change interaction behavior; the rest differ in rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Note,
    Photo,
    Embed,
    /// Grouping container for other nodes.
    Frame,
    /// A bare pushpin; its connection anchor is its center.
    Pin,
}

impl NodeKind {
    /// Size given to freshly created nodes of this kind.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            Self::Note | Self::Embed => (180.0, 150.0),
            Self::Photo => (180.0, 220.0),
            Self::Frame => (400.0, 300.0),
            Self::Pin => (30.0, 30.0),
        }
    }

    /// Whether new nodes of this kind get a casual tilt.
    fn is_tilted(self) -> bool {
        matches!(self, Self::Note | Self::Photo | Self::Embed)
    }
}

/// A rectangular item on the board.
///
/// `position` is the top-left corner of the unrotated box; rotation is applied
/// around the center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner of the unrotated box.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees, kept in `[0, 360)`.
    #[serde(default)]
    pub(crate) rotation: f64,
    /// Frame this node is grouped into.
    #[serde(default)]
    pub(crate) parent_id: Option<NodeId>,
    /// Text body or caption.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub text_color: Option<Color>,
    #[serde(default)]
    pub font_size: Option<f64>,
    /// Opaque media reference (image URL, embed link, file hash).
    #[serde(default)]
    pub media: Option<String>,
}

impl Node {
    /// Create an untilted node with an explicit size.
    pub fn new(kind: NodeKind, position: Point, width: f64, height: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            width,
            height,
            rotation: 0.0,
            parent_id: None,
            content: String::new(),
            color: None,
            text_color: None,
            font_size: None,
            media: None,
        }
    }

    /// Create a node of the kind's default size at `at`.
    ///
    /// Pins are centered on `at`; every other kind has its top-left corner
    /// there. Notes, photos and embeds get a tilt in `[-10°, 10°)`.
    pub fn create(kind: NodeKind, at: Point) -> Self {
        let (width, height) = kind.default_size();
        let position = match kind {
            NodeKind::Pin => Point::new(at.x - width / 2.0, at.y - height / 2.0),
            _ => at,
        };
        let mut node = match kind {
            NodeKind::Frame => Self::frame(Rect::from_origin_size(position, (width, height))),
            _ => Self::new(kind, position, width, height),
        };
        if kind == NodeKind::Pin {
            node.color = Some(Color::string_red());
        }
        if kind.is_tilted() {
            let unit = f64::from(next_seed()) / f64::from(u32::MAX);
            node.set_rotation(unit * 20.0 - 10.0);
        }
        node
    }

    /// An empty "Group" frame covering `rect`, with white title text.
    pub fn frame(rect: Rect) -> Self {
        let mut node = Self::new(NodeKind::Frame, rect.origin(), rect.width(), rect.height());
        node.content = "Group".to_string();
        node.text_color = Some(Color::white());
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation in degrees; the value is wrapped into `[0, 360)` and
    /// non-finite input leaves the rotation unchanged.
    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation = normalize_degrees(degrees);
        }
    }

    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent_id
    }

    pub fn is_frame(&self) -> bool {
        self.kind == NodeKind::Frame
    }

    /// Unrotated box in world coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// Axis-aligned box enclosing the rotated node.
    pub fn rotated_bounds(&self) -> Rect {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let corners = [
            self.local_to_world(Vec2::new(-half_w, -half_h)),
            self.local_to_world(Vec2::new(half_w, -half_h)),
            self.local_to_world(Vec2::new(half_w, half_h)),
            self.local_to_world(Vec2::new(-half_w, half_h)),
        ];
        corners[1..]
            .iter()
            .fold(Rect::from_points(corners[0], corners[0]), |rect, &p| rect.union_pt(p))
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.width / 2.0,
            self.position.y + self.height / 2.0,
        )
    }

    /// Map an offset in the node's local (unrotated, center-origin) frame to
    /// world coordinates.
    pub fn local_to_world(&self, local: Vec2) -> Point {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        self.center() + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    }

    /// Map a world point into the node's local frame (center origin, rotation
    /// undone).
    pub fn world_to_local(&self, world: Point) -> Vec2 {
        let d = world - self.center();
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos)
    }

    /// Anchor point where connection strings attach.
    ///
    /// Sits just above the top edge along the node's rotated up axis; frames
    /// keep it inside their header and pins use their center.
    pub fn pin_location(&self) -> Point {
        if self.kind == NodeKind::Pin {
            return self.center();
        }
        let offset = if self.is_frame() { -15.0 } else { 7.0 };
        self.local_to_world(Vec2::new(0.0, -(self.height / 2.0 + offset)))
    }

    /// Move by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_node_creation() {
        let node = Node::new(NodeKind::Note, Point::new(10.0, 20.0), 100.0, 50.0);
        assert_point_eq(node.center(), Point::new(60.0, 45.0));
        assert!(node.parent_id().is_none());
        assert!(node.rotation().abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_defaults() {
        let frame = Node::create(NodeKind::Frame, Point::new(0.0, 0.0));
        assert!((frame.width - 400.0).abs() < f64::EPSILON);
        assert!(frame.rotation().abs() < f64::EPSILON);
        assert_eq!(frame.content, "Group");
        assert_eq!(frame.text_color, Some(Color::white()));
        assert_eq!(Node::create(NodeKind::Note, Point::ZERO).text_color, None);

        let pin = Node::create(NodeKind::Pin, Point::new(100.0, 100.0));
        assert_point_eq(pin.center(), Point::new(100.0, 100.0));

        for _ in 0..20 {
            let note = Node::create(NodeKind::Note, Point::ZERO);
            let r = note.rotation();
            assert!(r < 10.0 + 1e-9 || r >= 350.0 - 1e-9, "tilt out of range: {r}");
        }
    }

    #[test]
    fn test_set_rotation_wraps_and_ignores_nan() {
        let mut node = Node::new(NodeKind::Note, Point::ZERO, 100.0, 100.0);
        node.set_rotation(-30.0);
        assert!((node.rotation() - 330.0).abs() < 1e-9);
        node.set_rotation(f64::NAN);
        assert!((node.rotation() - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_world_roundtrip_under_rotation() {
        let mut node = Node::new(NodeKind::Note, Point::new(100.0, 100.0), 200.0, 100.0);
        node.set_rotation(37.0);
        let local = Vec2::new(42.0, -17.0);
        let world = node.local_to_world(local);
        let back = node.world_to_local(world);
        assert!((back.x - local.x).abs() < 1e-9);
        assert!((back.y - local.y).abs() < 1e-9);
    }

    #[test]
    fn test_pin_location_follows_rotation() {
        let mut node = Node::new(NodeKind::Note, Point::new(0.0, 0.0), 100.0, 100.0);
        assert_point_eq(node.pin_location(), Point::new(50.0, -7.0));

        node.set_rotation(90.0);
        // Up axis now points to +x
        assert_point_eq(node.pin_location(), Point::new(107.0, 50.0));
    }

    #[test]
    fn test_frame_pin_sits_inside_header() {
        let frame = Node::new(NodeKind::Frame, Point::new(0.0, 0.0), 400.0, 300.0);
        assert_point_eq(frame.pin_location(), Point::new(200.0, 15.0));
    }

    #[test]
    fn test_rotated_bounds() {
        let mut node = Node::new(NodeKind::Note, Point::new(0.0, 0.0), 200.0, 100.0);
        node.set_rotation(90.0);
        let bounds = node.rotated_bounds();
        assert!((bounds.width() - 100.0).abs() < 1e-9);
        assert!((bounds.height() - 200.0).abs() < 1e-9);
        assert_point_eq(bounds.center(), node.center());
    }
}
