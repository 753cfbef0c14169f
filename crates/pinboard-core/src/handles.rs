//! Resize and rotate handles of a node.

use crate::entities::{Node, normalize_degrees};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Resize handle position on the node's own (rotated) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        Self::NW,
        Self::N,
        Self::NE,
        Self::E,
        Self::SE,
        Self::S,
        Self::SW,
        Self::W,
    ];

    /// Direction of the handle along the local x and y axes, each in
    /// `{-1, 0, 1}`.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Self::N => (0.0, -1.0),
            Self::S => (0.0, 1.0),
            Self::E => (1.0, 0.0),
            Self::W => (-1.0, 0.0),
            Self::NE => (1.0, -1.0),
            Self::NW => (-1.0, -1.0),
            Self::SE => (1.0, 1.0),
            Self::SW => (-1.0, 1.0),
        }
    }
}

/// Type of handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Resize(ResizeHandle),
    /// Rotation handle below the bottom edge.
    Rotate,
}

/// A handle with its world position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a world point hits this handle.
    /// `tolerance` should be adjusted for zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// All handles of a node, rotate handle first.
pub fn node_handles(node: &Node, rotate_offset: f64) -> Vec<Handle> {
    let half_w = node.width / 2.0;
    let half_h = node.height / 2.0;
    let mut handles = Vec::with_capacity(9);
    handles.push(Handle::new(
        node.local_to_world(Vec2::new(0.0, half_h + rotate_offset)),
        HandleKind::Rotate,
    ));
    for handle in ResizeHandle::ALL {
        let (sx, sy) = handle.signs();
        handles.push(Handle::new(
            node.local_to_world(Vec2::new(sx * half_w, sy * half_h)),
            HandleKind::Resize(handle),
        ));
    }
    handles
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(
    node: &Node,
    point: Point,
    tolerance: f64,
    rotate_offset: f64,
) -> Option<HandleKind> {
    node_handles(node, rotate_offset)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// Resize `node` from its pre-gesture state `original` by a world delta.
///
/// The delta is projected onto the node's local axes, so dragging always
/// grows along the node's own width and height. Each resized dimension is
/// clamped to `min_size` and the edge opposite the handle stays fixed. A
/// zero delta restores the original geometry, even below `min_size`.
pub fn apply_resize(
    node: &mut Node,
    original: &Node,
    handle: ResizeHandle,
    delta: Vec2,
    min_size: f64,
) {
    if delta == Vec2::ZERO {
        node.width = original.width;
        node.height = original.height;
        node.position = original.position;
        return;
    }
    let (sin, cos) = original.rotation().to_radians().sin_cos();
    let local_dx = delta.x * cos + delta.y * sin;
    let local_dy = -delta.x * sin + delta.y * cos;
    if !local_dx.is_finite() || !local_dy.is_finite() {
        return;
    }

    let (sx, sy) = handle.signs();
    let (w0, h0) = (original.width, original.height);
    let width = if sx == 0.0 { w0 } else { (w0 + sx * local_dx).max(min_size) };
    let height = if sy == 0.0 { h0 } else { (h0 + sy * local_dy).max(min_size) };

    // Opposite edge stays where it was
    let anchor = original.local_to_world(Vec2::new(-sx * w0 / 2.0, -sy * h0 / 2.0));
    let rotate = |v: Vec2| Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos);
    let center = anchor - rotate(Vec2::new(-sx * width / 2.0, -sy * height / 2.0));

    node.width = width;
    node.height = height;
    node.position = Point::new(center.x - width / 2.0, center.y - height / 2.0);
}

/// Angle in degrees from `center` to `point`, or `None` when the pointer sits
/// on the center.
pub fn pointer_angle(center: Point, point: Point) -> Option<f64> {
    let v = point - center;
    if v.hypot2() < f64::EPSILON {
        return None;
    }
    let angle = v.y.atan2(v.x).to_degrees();
    angle.is_finite().then_some(angle)
}

/// Rotation for a pointer at `angle` given the gesture's starting angle and
/// the node's starting rotation, wrapped to `[0, 360)`.
pub fn rotation_for(initial_rotation: f64, initial_angle: f64, angle: f64) -> f64 {
    normalize_degrees(initial_rotation + (angle - initial_angle))
}
