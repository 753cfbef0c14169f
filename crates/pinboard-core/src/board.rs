//! The board: scene, viewport and history behind one command surface.

use crate::config::EngineConfig;
use crate::entities::{
    Color, Edge, EdgeId, EdgeStyle, EntityId, Node, NodeId, NodeKind, StrokeId,
};
use crate::error::{ConfigError, SceneResult};
use crate::grouping;
use crate::hit::{self, Hit};
use crate::history::HistoryManager;
use crate::scene::{EntityKind, Removed, SceneStore};
use crate::viewport::Viewport;
use kurbo::{Point, Size};

/// Something that changed on the board, for hosts that persist or react.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    NodeAdded(NodeId),
    EdgeCreated {
        edge: EdgeId,
        from: NodeId,
        to: NodeId,
    },
    NodeReparented {
        node: NodeId,
        frame: Option<NodeId>,
    },
    StrokeCreated(StrokeId),
    StrokesErased(Vec<StrokeId>),
    /// Every removed id, cascaded edges included.
    EntitiesDeleted(Vec<EntityId>),
    /// A connection draft was released over empty canvas; the host may offer
    /// to add a node there connected to `source`.
    ConnectionDropped {
        source: NodeId,
        world: Point,
    },
    /// An undo step was pushed.
    HistoryCommitted,
    Undone,
}

/// Freehand tool used while drawing mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawTool {
    #[default]
    Pen,
    Eraser,
}

/// Drawing mode settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingMode {
    pub active: bool,
    pub tool: DrawTool,
    pub pen_color: Color,
}

impl Default for DrawingMode {
    fn default() -> Self {
        Self {
            active: false,
            tool: DrawTool::Pen,
            pen_color: Color::string_red(),
        }
    }
}

/// Board state plus the explicit commands that mutate it.
///
/// Every mutating command records exactly one undo step. Changes are
/// reported as [`BoardEvent`]s, collected until [`drain_events`](Self::drain_events).
#[derive(Debug, Clone)]
pub struct Board {
    scene: SceneStore,
    /// View transform; not part of undo history.
    pub viewport: Viewport,
    pub(crate) history: HistoryManager,
    config: EngineConfig,
    drawing: DrawingMode,
    pan_key_held: bool,
    events: Vec<BoardEvent>,
}

impl Default for Board {
    fn default() -> Self {
        Self::from_parts(SceneStore::new(), EngineConfig::default())
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(SceneStore::new(), config))
    }

    fn from_parts(scene: SceneStore, config: EngineConfig) -> Self {
        Self {
            scene,
            viewport: Viewport::new(),
            history: HistoryManager::new(config.history_limit),
            config,
            drawing: DrawingMode::default(),
            pan_key_held: false,
            events: Vec::new(),
        }
    }

    pub fn scene(&self) -> &SceneStore {
        &self.scene
    }

    pub(crate) fn scene_mut(&mut self) -> &mut SceneStore {
        &mut self.scene
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Replace the scene, e.g. after loading, and forget history.
    pub fn load_scene(&mut self, scene: SceneStore) {
        self.scene = scene;
        self.history.clear();
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: BoardEvent) {
        self.events.push(event);
    }

    /// Snapshot the scene before a gesture starts mutating it.
    pub(crate) fn begin_pending(&mut self) {
        self.history.begin(&self.scene);
    }

    /// Push the pending gesture snapshot, if any.
    pub(crate) fn commit_pending(&mut self) {
        if self.history.commit() {
            self.emit(BoardEvent::HistoryCommitted);
        }
    }

    /// Drop the pending gesture snapshot. A command that ran during the
    /// gesture still gets its step.
    pub(crate) fn discard_pending(&mut self) {
        if self.history.discard() {
            self.emit(BoardEvent::HistoryCommitted);
        }
    }

    /// Record a one-shot undo step for a mutation about to happen. During a
    /// gesture the mutation joins the gesture's step and false is returned.
    pub(crate) fn record_history(&mut self) -> bool {
        self.history.record(&self.scene)
    }

    pub(crate) fn announce_step(&mut self, recorded: bool) {
        if recorded {
            self.emit(BoardEvent::HistoryCommitted);
        }
    }

    // --- view ---

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    /// Classify what lies under a screen point.
    pub fn hit_at(&self, screen: Point) -> Hit {
        hit::hit_test(
            &self.scene,
            &self.viewport,
            &self.config,
            self.screen_to_world(screen),
        )
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom(&mut self, anchor: Point, scale_delta: f64) {
        self.viewport.zoom(anchor, scale_delta);
    }

    /// Fit the view around all content, or reset it on an empty board.
    pub fn zoom_to_fit(&mut self, viewport_size: Size) {
        match self.scene.bounds() {
            Some(bounds) => {
                self.viewport
                    .fit_to_bounds(bounds, viewport_size, self.config.frame_padding)
            }
            None => self.viewport.reset(),
        }
    }

    // --- drawing mode ---

    pub fn drawing(&self) -> DrawingMode {
        self.drawing
    }

    pub(crate) fn set_drawing_active(&mut self, active: bool) {
        self.drawing.active = active;
    }

    pub fn set_draw_tool(&mut self, tool: DrawTool) {
        self.drawing.tool = tool;
    }

    pub fn set_pen_color(&mut self, color: Color) {
        self.drawing.pen_color = color;
    }

    /// Host reports whether the pan key is held.
    pub fn set_pan_key(&mut self, held: bool) {
        self.pan_key_held = held;
    }

    pub fn pan_key_held(&self) -> bool {
        self.pan_key_held
    }

    // --- selection ---

    /// Replace the selection with `id`, if it exists.
    pub fn select(&mut self, id: EntityId) {
        self.scene.select(id);
    }

    pub fn toggle_selection(&mut self, id: EntityId) {
        self.scene.toggle_selection(id);
    }

    pub fn select_all(&mut self) {
        self.scene.select_all();
    }

    pub fn clear_selection(&mut self) {
        self.scene.clear_selection();
    }

    // --- creation ---

    /// Add a node of the kind's default size at `world` and select it.
    /// Frames go underneath every other node.
    pub fn add_node(&mut self, kind: NodeKind, world: Point) -> NodeId {
        self.insert_node(Node::create(kind, world))
    }

    /// Add a prepared node and select it.
    pub fn insert_node(&mut self, node: Node) -> NodeId {
        let recorded = self.record_history();
        let id = self.place_node(node);
        self.scene.select(id);
        self.announce_step(recorded);
        id
    }

    fn place_node(&mut self, node: Node) -> NodeId {
        let id = if node.is_frame() {
            self.scene.add_node_at_bottom(node)
        } else {
            self.scene.add_node(node)
        };
        log::debug!("Added node {id}");
        self.emit(BoardEvent::NodeAdded(id));
        id
    }

    /// Add a node at `world` connected from `source`.
    pub fn add_node_connected(
        &mut self,
        kind: NodeKind,
        world: Point,
        source: NodeId,
    ) -> Option<NodeId> {
        if self.scene.node(source).is_none() {
            log::warn!("Cannot connect new node: source {source} not found");
            return None;
        }
        let recorded = self.record_history();
        let id = self.place_node(Node::create(kind, world));
        self.place_edge(Edge::new(source, id));
        self.scene.select(id);
        self.announce_step(recorded);
        Some(id)
    }

    /// Insert a new node into `edge`, replacing it by two edges with the
    /// same look.
    pub fn split_edge(&mut self, edge: EdgeId, kind: NodeKind, world: Point) -> Option<NodeId> {
        let Some(original) = self.scene.edge(edge).cloned() else {
            log::warn!("Cannot split edge {edge}: not found");
            return None;
        };
        let recorded = self.record_history();
        let id = self.place_node(Node::create(kind, world));
        let removed = self.scene.remove_entities(&[edge]);
        self.emit(BoardEvent::EntitiesDeleted(removed.ids()));
        self.place_edge(original.restyled(original.from, id));
        self.place_edge(original.restyled(id, original.to));
        self.scene.select(id);
        self.announce_step(recorded);
        Some(id)
    }

    /// Connect two distinct existing nodes.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if from == to || self.scene.node(from).is_none() || self.scene.node(to).is_none() {
            log::trace!("Rejected connection {from} -> {to}");
            return None;
        }
        let recorded = self.record_history();
        let id = self.place_edge(Edge::new(from, to));
        self.announce_step(recorded);
        id
    }

    fn place_edge(&mut self, edge: Edge) -> Option<EdgeId> {
        let (from, to) = (edge.from, edge.to);
        let id = self.scene.add_edge(edge)?;
        log::debug!("Connected {from} -> {to}");
        self.emit(BoardEvent::EdgeCreated { edge: id, from, to });
        Some(id)
    }

    // --- structure ---

    /// Delete entities of any kind. Edges attached to deleted nodes go too
    /// and children of deleted frames are detached.
    pub fn delete_entities(&mut self, ids: &[EntityId]) -> Removed {
        if !ids.iter().any(|&id| self.scene.contains(id)) {
            return Removed::default();
        }
        let recorded = self.record_history();
        let removed = self.scene.remove_entities(ids);
        log::debug!(
            "Deleted {} nodes, {} edges, {} strokes",
            removed.nodes.len(),
            removed.edges.len(),
            removed.strokes.len()
        );
        self.emit(BoardEvent::EntitiesDeleted(removed.ids()));
        self.announce_step(recorded);
        removed
    }

    /// Delete everything selected.
    pub fn delete_selection(&mut self) -> Removed {
        let ids = self.scene.selected_ids();
        self.delete_entities(&ids)
    }

    /// Wrap the given nodes in a new frame sized to their padded bounds.
    ///
    /// The frame goes underneath every other node, becomes the parent of
    /// each grouped node and is selected. Non-node ids are ignored.
    pub fn group_into_frame(&mut self, ids: &[EntityId]) -> Option<NodeId> {
        let nodes: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|&id| self.scene.kind_of(id) == Some(EntityKind::Node))
            .collect();
        let rect = grouping::enclosing_rect(&self.scene, &nodes, self.config.frame_padding)?;

        let recorded = self.record_history();
        let frame_id = self.place_node(Node::frame(rect));
        for node in nodes {
            match self.scene.set_parent(node, Some(frame_id)) {
                Ok(()) => self.emit(BoardEvent::NodeReparented {
                    node,
                    frame: Some(frame_id),
                }),
                Err(err) => log::warn!("Not grouping {node}: {err}"),
            }
        }
        self.scene.select(frame_id);
        self.announce_step(recorded);
        Some(frame_id)
    }

    /// Group the selected nodes into a new frame.
    pub fn group_selection(&mut self) -> Option<NodeId> {
        let ids = self.scene.selected_ids();
        self.group_into_frame(&ids)
    }

    /// Explicitly assign `node` to `frame`, or detach it with `None`.
    pub fn set_parent(&mut self, node: NodeId, frame: Option<NodeId>) -> SceneResult<()> {
        let snapshot = self.scene.snapshot();
        if let Err(err) = self.scene.set_parent(node, frame) {
            log::warn!("Rejected grouping of {node}: {err}");
            return Err(err);
        }
        let recorded = self.history.record_snapshot(snapshot);
        self.emit(BoardEvent::NodeReparented { node, frame });
        self.announce_step(recorded);
        Ok(())
    }

    /// Set a node's rotation back to 0°. Returns false if there was nothing
    /// to reset.
    pub fn reset_rotation(&mut self, id: NodeId) -> bool {
        match self.scene.node(id) {
            Some(node) if node.rotation() != 0.0 => {}
            _ => return false,
        }
        let recorded = self.record_history();
        if let Some(node) = self.scene.node_mut(id) {
            node.set_rotation(0.0);
        }
        self.announce_step(recorded);
        true
    }

    /// Remove every stroke.
    pub fn clear_strokes(&mut self) -> Vec<StrokeId> {
        if self.scene.stroke_count() == 0 {
            return Vec::new();
        }
        let recorded = self.record_history();
        let removed = self.scene.clear_strokes();
        self.emit(BoardEvent::StrokesErased(removed.clone()));
        self.announce_step(recorded);
        removed
    }

    // --- attributes ---

    /// Apply `edit` to every listed id it accepts, recording one undo step
    /// if anything matched. Returns the number of entities edited.
    fn edit_entities<F>(&mut self, ids: &[EntityId], mut edit: F) -> usize
    where
        F: FnMut(&mut SceneStore, EntityId) -> bool,
    {
        let snapshot = self.scene.snapshot();
        let edited = ids.iter().filter(|&&id| edit(&mut self.scene, id)).count();
        if edited > 0 {
            let recorded = self.history.record_snapshot(snapshot);
            self.announce_step(recorded);
        }
        edited
    }

    /// Set the fill of nodes, the string color of edges and the ink of
    /// strokes. `None` restores defaults; strokes keep their ink.
    pub fn set_color(&mut self, ids: &[EntityId], color: Option<Color>) -> usize {
        self.edit_entities(ids, |scene, id| {
            if let Some(node) = scene.node_mut(id) {
                node.color = color;
                true
            } else if let Some(edge) = scene.edge_mut(id) {
                edge.color = color;
                true
            } else if let (Some(stroke), Some(color)) = (scene.stroke_mut(id), color) {
                stroke.color = color;
                true
            } else {
                false
            }
        })
    }

    pub fn set_text_color(&mut self, ids: &[EntityId], color: Option<Color>) -> usize {
        self.edit_entities(ids, |scene, id| match scene.node_mut(id) {
            Some(node) => {
                node.text_color = color;
                true
            }
            None => false,
        })
    }

    /// Set the font size of nodes; sizes that are not finite and positive
    /// are ignored.
    pub fn set_font_size(&mut self, ids: &[EntityId], size: Option<f64>) -> usize {
        if size.is_some_and(|s| !s.is_finite() || s <= 0.0) {
            log::trace!("Ignoring font size {size:?}");
            return 0;
        }
        self.edit_entities(ids, |scene, id| match scene.node_mut(id) {
            Some(node) => {
                node.font_size = size;
                true
            }
            None => false,
        })
    }

    pub fn set_edge_style(&mut self, ids: &[EntityId], style: EdgeStyle) -> usize {
        self.edit_entities(ids, |scene, id| match scene.edge_mut(id) {
            Some(edge) => {
                edge.style = style;
                true
            }
            None => false,
        })
    }

    /// Replace a node's text.
    pub fn set_content(&mut self, id: NodeId, content: impl Into<String>) -> bool {
        let content = content.into();
        self.edit_entities(&[id], |scene, id| match scene.node_mut(id) {
            Some(node) if node.content != content => {
                node.content = content.clone();
                true
            }
            _ => false,
        }) > 0
    }

    // --- history ---

    /// Restore the state before the last recorded step and clear the
    /// selection. Does nothing on an empty history.
    ///
    /// Hosts undo through [`GestureController::undo`], which also drops the
    /// active gesture.
    ///
    /// [`GestureController::undo`]: crate::gesture::GestureController::undo
    pub(crate) fn undo(&mut self) -> bool {
        if self.history.undo(&mut self.scene) {
            log::debug!("Undo ({} steps left)", self.history.len());
            self.emit(BoardEvent::Undone);
            true
        } else {
            log::trace!("Nothing to undo");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(board: &mut Board, x: f64, y: f64) -> NodeId {
        board.insert_node(Node::new(NodeKind::Note, Point::new(x, y), 100.0, 100.0))
    }

    #[test]
    fn test_add_node_selects_and_records() {
        let mut board = Board::new();
        let id = board.add_node(NodeKind::Photo, Point::new(10.0, 20.0));
        let node = board.scene().node(id).unwrap();
        assert!((node.height - 220.0).abs() < f64::EPSILON);
        assert!(board.scene().is_selected(id));
        assert_eq!(board.history().len(), 1);
        assert_eq!(
            board.drain_events(),
            vec![BoardEvent::NodeAdded(id), BoardEvent::HistoryCommitted]
        );
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn test_frames_are_added_underneath() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let f = board.add_node(NodeKind::Frame, Point::new(0.0, 0.0));
        let order: Vec<NodeId> = board.scene().nodes().map(Node::id).collect();
        assert_eq!(order, vec![f, a]);
    }

    #[test]
    fn test_connect_rejects_invalid() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let b = note(&mut board, 200.0, 0.0);
        let steps = board.history().len();
        assert!(board.connect(a, a).is_none());
        assert!(board.connect(a, uuid::Uuid::new_v4()).is_none());
        assert_eq!(board.history().len(), steps);
        assert!(board.connect(a, b).is_some());
        assert_eq!(board.history().len(), steps + 1);
    }

    #[test]
    fn test_split_edge_keeps_style() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let b = note(&mut board, 400.0, 0.0);
        let edge = board.connect(a, b).unwrap();
        board.set_edge_style(&[edge], EdgeStyle::Dashed);

        let mid = board.split_edge(edge, NodeKind::Note, Point::new(200.0, 0.0)).unwrap();
        let edges = board.scene().edges();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.style == EdgeStyle::Dashed));
        assert!(edges.iter().any(|e| e.from == a && e.to == mid));
        assert!(edges.iter().any(|e| e.from == mid && e.to == b));
        assert!(board.scene().edge(edge).is_none());
    }

    #[test]
    fn test_add_node_connected() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let id = board
            .add_node_connected(NodeKind::Note, Point::new(300.0, 0.0), a)
            .unwrap();
        assert!(board.scene().edges()[0].links(a, id));
        assert!(board.add_node_connected(NodeKind::Note, Point::ZERO, uuid::Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_group_into_frame() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let b = note(&mut board, 200.0, 100.0);
        board.drain_events();

        let frame = board.group_into_frame(&[a, b]).unwrap();
        let f = board.scene().node(frame).unwrap();
        assert!(f.is_frame());
        assert!((f.position.x + 40.0).abs() < 1e-9);
        assert!((f.position.y + 40.0).abs() < 1e-9);
        assert!((f.width - 380.0).abs() < 1e-9);
        assert!((f.height - 280.0).abs() < 1e-9);
        assert_eq!(f.text_color, Some(Color::white()));
        assert_eq!(board.scene().nodes().next().map(Node::id), Some(frame));
        assert_eq!(board.scene().node(a).unwrap().parent_id(), Some(frame));
        assert_eq!(board.scene().node(b).unwrap().parent_id(), Some(frame));
        assert!(board.scene().is_selected(frame));
        assert!(board.group_into_frame(&[]).is_none());

        // One undo removes the frame and the parent links
        board.undo();
        assert!(board.scene().node(frame).is_none());
        assert!(board.scene().node(a).unwrap().parent_id().is_none());
    }

    #[test]
    fn test_set_parent_rejects_cycle_without_history() {
        let mut board = Board::new();
        let outer = board.add_node(NodeKind::Frame, Point::ZERO);
        let inner = board.add_node(NodeKind::Frame, Point::new(10.0, 10.0));
        board.set_parent(inner, Some(outer)).unwrap();
        let steps = board.history().len();
        assert!(board.set_parent(outer, Some(inner)).is_err());
        assert_eq!(board.history().len(), steps);
    }

    #[test]
    fn test_attribute_edits() {
        let mut board = Board::new();
        let a = note(&mut board, 0.0, 0.0);
        let steps = board.history().len();

        assert_eq!(board.set_color(&[a], Color::from_hex("#ffeaa7")), 1);
        assert_eq!(board.set_font_size(&[a], Some(f64::NAN)), 0);
        assert_eq!(board.set_font_size(&[a], Some(18.0)), 1);
        assert!(board.set_content(a, "hello"));
        assert!(!board.set_content(a, "hello"));
        assert_eq!(board.set_edge_style(&[a], EdgeStyle::Dashed), 0);
        assert_eq!(board.history().len(), steps + 3);

        let node = board.scene().node(a).unwrap();
        assert_eq!(node.content, "hello");
        assert_eq!(node.font_size, Some(18.0));
    }

    #[test]
    fn test_reset_rotation() {
        let mut board = Board::new();
        let mut node = Node::new(NodeKind::Note, Point::ZERO, 100.0, 100.0);
        node.set_rotation(45.0);
        let id = board.insert_node(node);
        let steps = board.history().len();
        assert!(board.reset_rotation(id));
        assert!(board.scene().node(id).unwrap().rotation().abs() < f64::EPSILON);
        assert!(!board.reset_rotation(id));
        assert_eq!(board.history().len(), steps + 1);
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut board = Board::new();
        assert!(!board.undo());
        assert!(board.drain_events().is_empty());
    }

    #[test]
    fn test_with_config_validates() {
        let config = EngineConfig {
            history_limit: 0,
            ..EngineConfig::default()
        };
        assert!(Board::with_config(config).is_err());
    }
}
