//! Geometry queries against the scene.

use crate::config::EngineConfig;
use crate::entities::{
    Edge, EdgeId, EntityId, Node, NodeId, NodeKind, Stroke, StrokeId, distance_to_segment,
};
use crate::handles::{HandleKind, ResizeHandle, hit_test_handles};
use crate::scene::SceneStore;
use crate::viewport::Viewport;
use kurbo::{Point, Rect};

/// Result of a pointer hit test, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Rotate handle of a selected node.
    RotateHandle(NodeId),
    /// Resize handle of a selected node.
    ResizeHandle(NodeId, ResizeHandle),
    /// Connection pin of a node.
    Pin(NodeId),
    Stroke(StrokeId),
    /// Body of a non-frame node.
    Node(NodeId),
    Edge(EdgeId),
    /// Body of a frame.
    Frame(NodeId),
    Empty,
}

/// Whether `world` lies inside the node's rotated box.
pub fn point_in_node(world: Point, node: &Node) -> bool {
    let local = node.world_to_local(world);
    local.x.abs() <= node.width / 2.0 && local.y.abs() <= node.height / 2.0
}

/// Whether `world` lies within `threshold` of the stroke polyline.
pub fn point_near_stroke(world: Point, stroke: &Stroke, threshold: f64) -> bool {
    stroke.hit_test(world, threshold)
}

/// Axis-aligned containment, edges inclusive.
pub fn point_in_rect(world: Point, rect: Rect) -> bool {
    world.x >= rect.x0 && world.x <= rect.x1 && world.y >= rect.y0 && world.y <= rect.y1
}

/// Whether segments `a1..a2` and `b1..b2` intersect, touching included.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| (p - o).cross(q - o);
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };

    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Whether segment `a..b` touches `rect`, either by an endpoint inside or by
/// crossing one of its sides.
pub fn line_intersects_rect(a: Point, b: Point, rect: Rect) -> bool {
    if point_in_rect(a, rect) || point_in_rect(b, rect) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    (0..4).any(|i| segments_intersect(a, b, corners[i], corners[(i + 1) % 4]))
}

/// Whether any point of the stroke lies in `rect` or any segment crosses it.
pub fn stroke_intersects_rect(stroke: &Stroke, rect: Rect) -> bool {
    stroke.points.iter().any(|&p| point_in_rect(p, rect))
        || stroke
            .points
            .windows(2)
            .any(|pair| line_intersects_rect(pair[0], pair[1], rect))
}

/// Whether `world` lies within `threshold` of the string between the two
/// endpoints' pins. Edges with a missing endpoint never hit.
pub fn point_near_edge(world: Point, scene: &SceneStore, edge: &Edge, threshold: f64) -> bool {
    match (scene.node(edge.from), scene.node(edge.to)) {
        (Some(from), Some(to)) => {
            distance_to_segment(world, from.pin_location(), to.pin_location()) < threshold
        }
        _ => false,
    }
}

/// Topmost node whose body contains `world`. Non-frame nodes always rank
/// above frames.
pub fn node_at(scene: &SceneStore, world: Point) -> Option<NodeId> {
    node_at_excluding(scene, world, None)
}

fn node_at_excluding(scene: &SceneStore, world: Point, exclude: Option<NodeId>) -> Option<NodeId> {
    let candidate = |node: &&Node| Some(node.id()) != exclude && point_in_node(world, node);
    scene
        .nodes()
        .rev()
        .filter(|node| !node.is_frame())
        .find(&candidate)
        .or_else(|| scene.frames().rev().find(&candidate))
        .map(Node::id)
}

/// Topmost node whose connection pin lies within `radius` of `world`.
///
/// Pin-kind nodes are left out: pressing on them drags the pin itself.
pub fn connection_pin_at(scene: &SceneStore, world: Point, radius: f64) -> Option<NodeId> {
    scene
        .nodes()
        .rev()
        .filter(|node| node.kind != NodeKind::Pin)
        .find(|node| node.pin_location().distance(world) <= radius)
        .map(Node::id)
}

/// Node a connection draft dropped at `world` attaches to.
///
/// Any node other than `source` whose pin lies within `radius` wins;
/// otherwise the topmost node body under the pointer.
pub fn connection_target_at(
    scene: &SceneStore,
    world: Point,
    radius: f64,
    source: NodeId,
) -> Option<NodeId> {
    scene
        .nodes()
        .rev()
        .filter(|node| node.id() != source)
        .find(|node| node.pin_location().distance(world) <= radius)
        .map(Node::id)
        .or_else(|| node_at_excluding(scene, world, Some(source)))
}

/// Topmost stroke within `threshold` of `world`.
pub fn stroke_at(scene: &SceneStore, world: Point, threshold: f64) -> Option<StrokeId> {
    scene
        .strokes()
        .rev()
        .find(|stroke| point_near_stroke(world, stroke, threshold))
        .map(Stroke::id)
}

/// Most recently created edge within `threshold` of `world`.
pub fn edge_at(scene: &SceneStore, world: Point, threshold: f64) -> Option<EdgeId> {
    scene
        .edges()
        .iter()
        .rev()
        .find(|edge| point_near_edge(world, scene, edge, threshold))
        .map(Edge::id)
}

/// Entities picked by a selection rectangle: nodes whose center is inside,
/// and strokes that have a point inside or cross it.
pub fn entities_in_rect(scene: &SceneStore, rect: Rect) -> Vec<EntityId> {
    let rect = rect.abs();
    scene
        .nodes()
        .filter(|node| point_in_rect(node.center(), rect))
        .map(Node::id)
        .chain(
            scene
                .strokes()
                .filter(|stroke| stroke_intersects_rect(stroke, rect))
                .map(Stroke::id),
        )
        .collect()
}

/// Classify what lies under `world`.
///
/// Priority: handles of selected nodes, connection pins, strokes, non-frame
/// nodes, edges, frames. Pixel tolerances from `config` are scaled by the
/// viewport so corridors keep their on-screen size.
pub fn hit_test(
    scene: &SceneStore,
    viewport: &Viewport,
    config: &EngineConfig,
    world: Point,
) -> Hit {
    let handle_tolerance = viewport.screen_dist_to_world(config.handle_radius_px);
    for node in scene.nodes().rev().filter(|node| scene.is_selected(node.id())) {
        match hit_test_handles(node, world, handle_tolerance, config.rotate_handle_offset) {
            Some(HandleKind::Rotate) => return Hit::RotateHandle(node.id()),
            Some(HandleKind::Resize(handle)) => return Hit::ResizeHandle(node.id(), handle),
            None => {}
        }
    }

    let pin_radius = viewport.screen_dist_to_world(config.pin_radius_px);
    if let Some(id) = connection_pin_at(scene, world, pin_radius) {
        return Hit::Pin(id);
    }

    let stroke_threshold = viewport.screen_dist_to_world(config.stroke_hit_px);
    if let Some(id) = stroke_at(scene, world, stroke_threshold) {
        return Hit::Stroke(id);
    }

    if let Some(node) = scene
        .nodes()
        .rev()
        .find(|node| !node.is_frame() && point_in_node(world, node))
    {
        return Hit::Node(node.id());
    }

    let edge_threshold = viewport.screen_dist_to_world(config.edge_hit_px);
    if let Some(id) = edge_at(scene, world, edge_threshold) {
        return Hit::Edge(id);
    }

    if let Some(frame) = scene.frames().rev().find(|frame| point_in_node(world, frame)) {
        return Hit::Frame(frame.id());
    }

    Hit::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Color;

    fn node_at_rect(scene: &mut SceneStore, kind: NodeKind, x: f64, y: f64, w: f64, h: f64) -> NodeId {
        scene.add_node(Node::new(kind, Point::new(x, y), w, h))
    }

    #[test]
    fn test_point_in_rotated_node() {
        let mut node = Node::new(NodeKind::Note, Point::new(100.0, 100.0), 200.0, 100.0);
        assert!(point_in_node(Point::new(290.0, 110.0), &node));

        node.set_rotation(90.0);
        assert!(!point_in_node(Point::new(290.0, 110.0), &node));
        // (290, 110) is local (90, -40); rotated by 90° that is world (240, 240)
        assert!(point_in_node(Point::new(240.0, 240.0), &node));
    }

    #[test]
    fn test_segments_intersect() {
        let p = Point::new;
        assert!(segments_intersect(p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0), p(10.0, 0.0)));
        assert!(!segments_intersect(p(0.0, 0.0), p(10.0, 0.0), p(0.0, 5.0), p(10.0, 5.0)));
        // Touching at an endpoint
        assert!(segments_intersect(p(0.0, 0.0), p(5.0, 5.0), p(5.0, 5.0), p(10.0, 0.0)));
    }

    #[test]
    fn test_line_crossing_rect() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(line_intersects_rect(Point::new(0.0, 15.0), Point::new(30.0, 15.0), rect));
        assert!(line_intersects_rect(Point::new(15.0, 15.0), Point::new(100.0, 100.0), rect));
        assert!(!line_intersects_rect(Point::new(0.0, 0.0), Point::new(30.0, 0.0), rect));
    }

    #[test]
    fn test_rect_selection_picks_centers_and_crossing_strokes() {
        let mut scene = SceneStore::new();
        let inside = node_at_rect(&mut scene, NodeKind::Note, 0.0, 0.0, 100.0, 100.0);
        let partial = node_at_rect(&mut scene, NodeKind::Note, 150.0, 0.0, 100.0, 100.0);
        let crossing = scene.add_stroke(Stroke::from_points(
            vec![Point::new(-50.0, 20.0), Point::new(250.0, 20.0)],
            Color::black(),
        ));
        let outside = scene.add_stroke(Stroke::from_points(
            vec![Point::new(-50.0, 500.0), Point::new(250.0, 500.0)],
            Color::black(),
        ));

        let picked = entities_in_rect(&scene, Rect::new(180.0, 180.0, -10.0, -10.0));
        assert!(picked.contains(&inside));
        assert!(!picked.contains(&partial));
        assert!(picked.contains(&crossing));
        assert!(!picked.contains(&outside));
    }

    #[test]
    fn test_priority_nodes_over_frames_and_topmost_wins() {
        let mut scene = SceneStore::new();
        let viewport = Viewport::new();
        let config = EngineConfig::default();
        let lower = node_at_rect(&mut scene, NodeKind::Note, 50.0, 50.0, 100.0, 100.0);
        let upper = node_at_rect(&mut scene, NodeKind::Note, 100.0, 100.0, 100.0, 100.0);
        // Added last, yet still ranked below the notes
        let frame = node_at_rect(&mut scene, NodeKind::Frame, 0.0, 0.0, 400.0, 300.0);

        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(120.0, 120.0)), Hit::Node(upper));
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(60.0, 80.0)), Hit::Node(lower));
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(350.0, 250.0)), Hit::Frame(frame));
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(900.0, 900.0)), Hit::Empty);
    }

    #[test]
    fn test_handles_only_for_selected_nodes() {
        let mut scene = SceneStore::new();
        let viewport = Viewport::new();
        let config = EngineConfig::default();
        let id = node_at_rect(&mut scene, NodeKind::Note, 0.0, 0.0, 200.0, 100.0);
        let corner = Point::new(200.0, 100.0);

        assert_eq!(hit_test(&scene, &viewport, &config, corner), Hit::Node(id));
        scene.select(id);
        assert_eq!(
            hit_test(&scene, &viewport, &config, corner),
            Hit::ResizeHandle(id, ResizeHandle::SE)
        );
        assert_eq!(
            hit_test(&scene, &viewport, &config, Point::new(100.0, 125.0)),
            Hit::RotateHandle(id)
        );
    }

    #[test]
    fn test_pins_strokes_and_edges() {
        let mut scene = SceneStore::new();
        let viewport = Viewport::new();
        let config = EngineConfig::default();
        let a = node_at_rect(&mut scene, NodeKind::Note, 0.0, 0.0, 100.0, 100.0);
        let b = node_at_rect(&mut scene, NodeKind::Note, 300.0, 0.0, 100.0, 100.0);
        let edge = scene.add_edge(Edge::new(a, b)).unwrap();
        let stroke = scene.add_stroke(Stroke::from_points(
            vec![Point::new(0.0, 50.0), Point::new(100.0, 50.0)],
            Color::black(),
        ));

        // Pin sits 7 units above the top edge
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(50.0, -7.0)), Hit::Pin(a));
        // Stroke beats the node underneath
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(50.0, 52.0)), Hit::Stroke(stroke));
        // Along the string between the pins
        assert_eq!(hit_test(&scene, &viewport, &config, Point::new(200.0, -5.0)), Hit::Edge(edge));
    }

    #[test]
    fn test_hit_corridor_scales_with_zoom() {
        let mut scene = SceneStore::new();
        let config = EngineConfig::default();
        scene.add_stroke(Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            Color::black(),
        ));
        let mut viewport = Viewport::new();
        let sample = Point::new(50.0, 15.0);
        assert_eq!(hit_test(&scene, &viewport, &config, sample), Hit::Empty);
        viewport.set_scale(0.5);
        assert!(matches!(hit_test(&scene, &viewport, &config, sample), Hit::Stroke(_)));
    }

    #[test]
    fn test_connection_target_prefers_pins_then_bodies() {
        let mut scene = SceneStore::new();
        let source = node_at_rect(&mut scene, NodeKind::Note, 0.0, 0.0, 100.0, 100.0);
        let target = node_at_rect(&mut scene, NodeKind::Note, 300.0, 0.0, 100.0, 100.0);
        let pin = node_at_rect(&mut scene, NodeKind::Pin, 600.0, 0.0, 30.0, 30.0);

        assert_eq!(connection_target_at(&scene, Point::new(350.0, -7.0), 10.0, source), Some(target));
        assert_eq!(connection_target_at(&scene, Point::new(350.0, 60.0), 10.0, source), Some(target));
        assert_eq!(connection_target_at(&scene, Point::new(615.0, 15.0), 10.0, source), Some(pin));
        assert_eq!(connection_target_at(&scene, Point::new(50.0, 50.0), 10.0, source), None);
        assert_eq!(connection_pin_at(&scene, Point::new(615.0, 15.0), 10.0), None);
    }
}
