//! Pointer gesture state machine.

use crate::board::{Board, BoardEvent, DrawTool};
use crate::entities::{EdgeId, EntityId, Node, NodeId, Stroke, StrokeId};
use crate::grouping;
use crate::handles::{self, ResizeHandle};
use crate::hit::{self, Hit};
use crate::input::{MouseButton, PointerEvent, PointerInput};
use crate::scene::{EntityKind, SceneStore};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Pre-gesture geometry of a moved entity.
#[derive(Debug, Clone, PartialEq)]
enum Origin {
    Node(Point),
    Stroke(Vec<Point>),
}

/// Entities being dragged and where they started.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGesture {
    primary: EntityId,
    /// Screen position where the drag started.
    start: Point,
    origins: HashMap<EntityId, Origin>,
    moved: bool,
}

impl MoveGesture {
    pub fn primary(&self) -> EntityId {
        self.primary
    }

    /// Ids being moved, frame descendants included.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.origins.keys().copied()
    }
}

/// The active gesture. Exactly one is active at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    /// Pressed on a node; not a drag until the pointer travels far enough.
    PendingDrag {
        node: NodeId,
        start: Point,
    },
    /// Marquee selection, corners in world coordinates.
    RectSelecting {
        anchor: Point,
        current: Point,
    },
    Moving(MoveGesture),
    Resizing {
        node: NodeId,
        handle: ResizeHandle,
        start: Point,
        original: Box<Node>,
        changed: bool,
    },
    Rotating {
        node: NodeId,
        center: Point,
        /// Pointer angle at the start; `None` until the pointer leaves the
        /// center.
        initial_angle: Option<f64>,
        initial_rotation: f64,
        changed: bool,
    },
    /// Connection draft from `source`, endpoints in world coordinates.
    Connecting {
        source: NodeId,
        start: Point,
        current: Point,
    },
    /// Pen stroke being drawn; not in the scene until released.
    Drawing {
        stroke: Stroke,
    },
    Erasing {
        erased: Vec<StrokeId>,
    },
}

impl GestureState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning { .. } => "panning",
            Self::PendingDrag { .. } => "pending-drag",
            Self::RectSelecting { .. } => "rect-selecting",
            Self::Moving(_) => "moving",
            Self::Resizing { .. } => "resizing",
            Self::Rotating { .. } => "rotating",
            Self::Connecting { .. } => "connecting",
            Self::Drawing { .. } => "drawing",
            Self::Erasing { .. } => "erasing",
        }
    }
}

/// Interprets pointer input as gestures on a [`Board`].
///
/// Each gesture records at most one undo step: the scene is captured when
/// the gesture first mutates and committed when it ends.
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    state: GestureState,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// Marquee rectangle in world coordinates (for rendering).
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.state {
            GestureState::RectSelecting { anchor, current } => {
                Some(Rect::from_points(*anchor, *current))
            }
            _ => None,
        }
    }

    /// Draft connection line `(start, current)` in world coordinates.
    pub fn connection_draft(&self) -> Option<(Point, Point)> {
        match &self.state {
            GestureState::Connecting { start, current, .. } => Some((*start, *current)),
            _ => None,
        }
    }

    /// Stroke being drawn (for rendering).
    pub fn draft_stroke(&self) -> Option<&Stroke> {
        match &self.state {
            GestureState::Drawing { stroke } => Some(stroke),
            _ => None,
        }
    }

    fn set_state(&mut self, state: GestureState) {
        log::debug!("Gesture {} -> {}", self.state.name(), state.name());
        self.state = state;
    }

    // --- pointer level ---

    /// Dispatch a pointer event.
    pub fn handle(&mut self, board: &mut Board, event: PointerEvent) {
        match event {
            PointerEvent::Down(input) => self.pointer_down(board, input),
            PointerEvent::Move(input) => self.pointer_move(board, input),
            PointerEvent::Up(input) => self.pointer_up(board, input),
            PointerEvent::Wheel { position, delta_y } => self.wheel(board, position, delta_y),
            PointerEvent::DoubleClick(input) => {
                self.double_click(board, input);
            }
        }
    }

    /// Start a gesture from whatever lies under the pointer.
    pub fn pointer_down(&mut self, board: &mut Board, input: PointerInput) {
        self.end_active(board);

        let screen = input.position;
        match input.button {
            MouseButton::Right => return,
            MouseButton::Middle => {
                self.set_state(GestureState::Panning { last: screen });
                return;
            }
            MouseButton::Left if board.pan_key_held() => {
                self.set_state(GestureState::Panning { last: screen });
                return;
            }
            MouseButton::Left => {}
        }

        let drawing = board.drawing();
        if drawing.active {
            match drawing.tool {
                DrawTool::Pen => self.begin_stroke(board, screen),
                DrawTool::Eraser => self.begin_erase(board, screen),
            }
            return;
        }

        let shift = input.modifiers.shift;
        match board.hit_at(screen) {
            Hit::RotateHandle(node) => self.begin_rotate(board, node, screen),
            Hit::ResizeHandle(node, handle) => self.begin_resize(board, node, handle, screen),
            Hit::Pin(node) => self.begin_connect(board, node, screen),
            Hit::Stroke(stroke) => {
                if shift {
                    board.scene_mut().toggle_selection(stroke);
                } else {
                    select_unless_selected(board.scene_mut(), stroke);
                    self.begin_move(board, stroke, screen);
                }
            }
            Hit::Node(node) | Hit::Frame(node) => {
                if shift {
                    board.scene_mut().toggle_selection(node);
                } else {
                    select_unless_selected(board.scene_mut(), node);
                    self.set_state(GestureState::PendingDrag {
                        node,
                        start: screen,
                    });
                }
            }
            Hit::Edge(edge) => {
                if shift {
                    board.scene_mut().toggle_selection(edge);
                } else {
                    board.scene_mut().select(edge);
                }
            }
            Hit::Empty => self.begin_rect_select(board, screen, shift),
        }
    }

    /// Advance the active gesture.
    pub fn pointer_move(&mut self, board: &mut Board, input: PointerInput) {
        let screen = input.position;
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                board.pan(delta.x, delta.y);
            }
            GestureState::PendingDrag { node, start } => {
                if (screen - *start).hypot() > board.config().drag_threshold_px {
                    let (node, start) = (*node, *start);
                    self.state = GestureState::Idle;
                    self.begin_move(board, node, start);
                    self.update_move(board, screen);
                }
            }
            GestureState::RectSelecting { .. } => self.update_rect_select(board, screen),
            GestureState::Moving(_) => self.update_move(board, screen),
            GestureState::Resizing { .. } => self.update_resize(board, screen),
            GestureState::Rotating { .. } => self.update_rotate(board, screen),
            GestureState::Connecting { .. } => self.update_connect(board, screen),
            GestureState::Drawing { .. } => self.append_stroke(board, screen),
            GestureState::Erasing { .. } => {
                let world = board.screen_to_world(screen);
                self.erase_at(board, world);
            }
        }
    }

    /// Apply the final position and end the active gesture.
    pub fn pointer_up(&mut self, board: &mut Board, input: PointerInput) {
        self.pointer_move(board, input);
        self.finish(board);
    }

    /// Wheel zoom around `anchor`; ignored in drawing mode.
    pub fn wheel(&mut self, board: &mut Board, anchor: Point, delta_y: f64) {
        if board.drawing().active {
            log::trace!("Wheel ignored in drawing mode");
            return;
        }
        let speed = board.config().wheel_zoom_speed;
        board.viewport.wheel(anchor, delta_y, speed);
    }

    /// Double-click on the rotate handle of a selected node resets its
    /// rotation. Returns true if a rotation was reset.
    pub fn double_click(&mut self, board: &mut Board, input: PointerInput) -> bool {
        if let Hit::RotateHandle(node) = board.hit_at(input.position) {
            return board.reset_rotation(node);
        }
        false
    }

    /// Missed release: end whatever is still active before a new gesture
    /// starts.
    fn end_active(&mut self, board: &mut Board) {
        if !self.is_idle() {
            log::debug!("Starting a gesture while {}; ending it", self.state.name());
            self.finish(board);
        }
    }

    /// End the active gesture as a release would.
    fn finish(&mut self, board: &mut Board) {
        match &self.state {
            GestureState::Idle => {}
            GestureState::Panning { .. } => self.set_state(GestureState::Idle),
            GestureState::PendingDrag { node, .. } => {
                log::trace!("Click on {node}");
                self.set_state(GestureState::Idle);
            }
            GestureState::RectSelecting { .. } => {
                self.end_rect_select(board);
            }
            GestureState::Moving(_) => self.end_move(board),
            GestureState::Resizing { .. } => self.end_resize(board),
            GestureState::Rotating { .. } => self.end_rotate(board),
            GestureState::Connecting { .. } => {
                self.end_connect(board);
            }
            GestureState::Drawing { .. } => {
                self.end_stroke(board);
            }
            GestureState::Erasing { .. } => self.end_erase(board),
        }
    }

    /// Abandon the active gesture.
    ///
    /// Mutations already applied are kept and recorded as one undo step; a
    /// connection draft or marquee is dropped without effect.
    pub fn cancel(&mut self, board: &mut Board) {
        match &self.state {
            GestureState::Connecting { .. } | GestureState::RectSelecting { .. } => {
                self.set_state(GestureState::Idle);
            }
            _ => self.finish(board),
        }
    }

    /// Undo the last step. An active gesture is dropped first so it cannot
    /// keep editing the restored scene.
    pub fn undo(&mut self, board: &mut Board) -> bool {
        if !self.is_idle() {
            self.set_state(GestureState::Idle);
        }
        board.undo()
    }

    /// Enter or leave drawing mode, ending any active gesture.
    pub fn set_drawing_mode(&mut self, board: &mut Board, active: bool) {
        if board.drawing().active == active {
            return;
        }
        self.cancel(board);
        board.set_drawing_active(active);
        log::debug!("Drawing mode {}", if active { "on" } else { "off" });
    }

    pub fn toggle_drawing_mode(&mut self, board: &mut Board) {
        let active = !board.drawing().active;
        self.set_drawing_mode(board, active);
    }

    // --- rect select ---

    /// Start a marquee at a screen point. Without `additive` the current
    /// selection is cleared.
    pub fn begin_rect_select(&mut self, board: &mut Board, screen: Point, additive: bool) {
        self.end_active(board);
        if !additive {
            board.clear_selection();
        }
        let anchor = board.screen_to_world(screen);
        self.set_state(GestureState::RectSelecting {
            anchor,
            current: anchor,
        });
    }

    pub fn update_rect_select(&mut self, board: &mut Board, screen: Point) {
        let world = board.screen_to_world(screen);
        match &mut self.state {
            GestureState::RectSelecting { current, .. } => *current = world,
            other => log::trace!("update_rect_select while {}", other.name()),
        }
    }

    /// Select everything the marquee picked; returns the picked ids.
    pub fn end_rect_select(&mut self, board: &mut Board) -> Vec<EntityId> {
        let GestureState::RectSelecting { anchor, current } = self.state else {
            log::trace!("end_rect_select while {}", self.state.name());
            return Vec::new();
        };
        self.set_state(GestureState::Idle);
        let picked = hit::entities_in_rect(board.scene(), Rect::from_points(anchor, current));
        for &id in &picked {
            board.scene_mut().add_to_selection(id);
        }
        picked
    }

    // --- move ---

    /// Start dragging `primary` together with the selection and, for
    /// frames, everything inside them.
    pub fn begin_move(&mut self, board: &mut Board, primary: EntityId, screen: Point) {
        self.end_active(board);
        let scene = board.scene();
        let mut ids = scene.selected_ids();
        if !ids.contains(&primary) {
            ids.push(primary);
        }

        let mut origins = HashMap::new();
        for id in ids {
            capture_origin(scene, id, &mut origins);
            if scene.node(id).is_some_and(Node::is_frame) {
                for child in scene.descendants_of(id) {
                    capture_origin(scene, child, &mut origins);
                }
            }
        }
        if !origins.contains_key(&primary) {
            log::trace!("Nothing to move for {primary}");
            return;
        }

        board.begin_pending();
        log::debug!("Moving {} entities", origins.len());
        self.set_state(GestureState::Moving(MoveGesture {
            primary,
            start: screen,
            origins,
            moved: false,
        }));
    }

    /// Translate every captured entity by the cumulative pointer delta.
    pub fn update_move(&mut self, board: &mut Board, screen: Point) {
        let GestureState::Moving(gesture) = &mut self.state else {
            log::trace!("update_move outside a move");
            return;
        };
        let delta = (screen - gesture.start) / board.viewport.scale();
        if !delta.is_finite() {
            return;
        }
        let scene = board.scene_mut();
        gesture.origins.retain(|&id, origin| {
            let applied = match origin {
                Origin::Node(position) => scene
                    .node_mut(id)
                    .map(|node| node.position = *position + delta)
                    .is_some(),
                Origin::Stroke(points) => scene
                    .stroke_mut(id)
                    .map(|stroke| {
                        for (point, start) in stroke.points.iter_mut().zip(points.iter()) {
                            *point = *start + delta;
                        }
                    })
                    .is_some(),
            };
            if !applied {
                log::warn!("{id} disappeared during move; skipping it");
            }
            applied
        });
        gesture.moved |= delta != Vec2::ZERO;
    }

    /// Finish the drag: regroup the primary node and commit one undo step.
    pub fn end_move(&mut self, board: &mut Board) {
        if !matches!(self.state, GestureState::Moving(_)) {
            log::trace!("end_move while {}", self.state.name());
            return;
        }
        let GestureState::Moving(gesture) = std::mem::take(&mut self.state) else {
            return;
        };
        log::debug!("Gesture moving -> idle");
        if !gesture.moved {
            board.discard_pending();
            return;
        }
        if board.scene().kind_of(gesture.primary) == Some(EntityKind::Node) {
            if let Some(change) = grouping::resolve(board.scene_mut(), gesture.primary) {
                board.emit(BoardEvent::NodeReparented {
                    node: change.node,
                    frame: change.to,
                });
            }
        }
        board.commit_pending();
    }

    // --- resize ---

    pub fn begin_resize(
        &mut self,
        board: &mut Board,
        node: NodeId,
        handle: ResizeHandle,
        screen: Point,
    ) {
        self.end_active(board);
        let Some(original) = board.scene().node(node).cloned() else {
            log::trace!("Cannot resize missing node {node}");
            return;
        };
        board.begin_pending();
        self.set_state(GestureState::Resizing {
            node,
            handle,
            start: screen,
            original: Box::new(original),
            changed: false,
        });
    }

    pub fn update_resize(&mut self, board: &mut Board, screen: Point) {
        let GestureState::Resizing {
            node,
            handle,
            start,
            original,
            changed,
        } = &mut self.state
        else {
            log::trace!("update_resize outside a resize");
            return;
        };
        let delta = (screen - *start) / board.viewport.scale();
        let min_size = board.config().min_node_size;
        match board.scene_mut().node_mut(*node) {
            Some(target) => {
                handles::apply_resize(target, original, *handle, delta, min_size);
                *changed = target.width != original.width
                    || target.height != original.height
                    || target.position != original.position;
            }
            None => log::trace!("Resize target {node} is gone"),
        }
    }

    pub fn end_resize(&mut self, board: &mut Board) {
        if !matches!(self.state, GestureState::Resizing { .. }) {
            log::trace!("end_resize while {}", self.state.name());
            return;
        }
        let GestureState::Resizing { node, changed, .. } = std::mem::take(&mut self.state) else {
            return;
        };
        log::debug!("Gesture resizing -> idle");
        self.end_edit(board, node, changed);
    }

    /// Commit an edit gesture on `node`, or drop its snapshot if nothing
    /// changed.
    fn end_edit(&mut self, board: &mut Board, node: NodeId, changed: bool) {
        if board.scene().node(node).is_none() {
            log::warn!("Node {node} disappeared during gesture");
        }
        if changed {
            board.commit_pending();
        } else {
            board.discard_pending();
        }
    }

    // --- rotate ---

    pub fn begin_rotate(&mut self, board: &mut Board, node: NodeId, screen: Point) {
        self.end_active(board);
        let world = board.screen_to_world(screen);
        let Some(target) = board.scene().node(node) else {
            log::trace!("Cannot rotate missing node {node}");
            return;
        };
        let center = target.center();
        let initial_rotation = target.rotation();
        board.begin_pending();
        self.set_state(GestureState::Rotating {
            node,
            center,
            initial_angle: handles::pointer_angle(center, world),
            initial_rotation,
            changed: false,
        });
    }

    pub fn update_rotate(&mut self, board: &mut Board, screen: Point) {
        let world = board.screen_to_world(screen);
        let GestureState::Rotating {
            node,
            center,
            initial_angle,
            initial_rotation,
            changed,
        } = &mut self.state
        else {
            log::trace!("update_rotate outside a rotation");
            return;
        };
        let Some(angle) = handles::pointer_angle(*center, world) else {
            return;
        };
        let Some(start) = *initial_angle else {
            *initial_angle = Some(angle);
            return;
        };
        let rotation = handles::rotation_for(*initial_rotation, start, angle);
        if let Some(target) = board.scene_mut().node_mut(*node) {
            target.set_rotation(rotation);
            *changed = true;
        }
    }

    pub fn end_rotate(&mut self, board: &mut Board) {
        if !matches!(self.state, GestureState::Rotating { .. }) {
            log::trace!("end_rotate while {}", self.state.name());
            return;
        }
        let GestureState::Rotating { node, changed, .. } = std::mem::take(&mut self.state) else {
            return;
        };
        log::debug!("Gesture rotating -> idle");
        self.end_edit(board, node, changed);
    }

    // --- connect ---

    /// Start a connection draft from the pin of `source`.
    pub fn begin_connect(&mut self, board: &mut Board, source: NodeId, screen: Point) {
        self.end_active(board);
        let Some(start) = board.scene().node(source).map(Node::pin_location) else {
            log::trace!("Cannot connect from missing node {source}");
            return;
        };
        let current = board.screen_to_world(screen);
        self.set_state(GestureState::Connecting {
            source,
            start,
            current,
        });
    }

    pub fn update_connect(&mut self, board: &mut Board, screen: Point) {
        let world = board.screen_to_world(screen);
        match &mut self.state {
            GestureState::Connecting { current, .. } => *current = world,
            other => log::trace!("update_connect while {}", other.name()),
        }
    }

    /// Drop the draft: connect to the node under it, or report a drop on
    /// empty canvas with [`BoardEvent::ConnectionDropped`].
    pub fn end_connect(&mut self, board: &mut Board) -> Option<EdgeId> {
        let GestureState::Connecting {
            source, current, ..
        } = self.state
        else {
            log::trace!("end_connect while {}", self.state.name());
            return None;
        };
        self.set_state(GestureState::Idle);

        if board.scene().node(source).is_none() {
            log::warn!("Connection source {source} disappeared");
            return None;
        }
        let radius = board.viewport.screen_dist_to_world(board.config().pin_radius_px);
        match hit::connection_target_at(board.scene(), current, radius, source) {
            Some(target) => board.connect(source, target),
            None => {
                let hit = hit::hit_test(board.scene(), &board.viewport, board.config(), current);
                if hit == Hit::Empty {
                    board.emit(BoardEvent::ConnectionDropped {
                        source,
                        world: current,
                    });
                }
                None
            }
        }
    }

    // --- draw & erase ---

    /// Start a pen stroke at a screen point.
    pub fn begin_stroke(&mut self, board: &mut Board, screen: Point) {
        self.end_active(board);
        let world = board.screen_to_world(screen);
        let stroke = Stroke::new(world, board.drawing().pen_color);
        self.set_state(GestureState::Drawing { stroke });
    }

    pub fn append_stroke(&mut self, board: &mut Board, screen: Point) {
        let world = board.screen_to_world(screen);
        match &mut self.state {
            GestureState::Drawing { stroke } => stroke.add_point(world),
            other => log::trace!("append_stroke while {}", other.name()),
        }
    }

    /// Add the drawn stroke to the scene. Strokes with fewer than two points
    /// are dropped.
    pub fn end_stroke(&mut self, board: &mut Board) -> Option<StrokeId> {
        if !matches!(self.state, GestureState::Drawing { .. }) {
            log::trace!("end_stroke while {}", self.state.name());
            return None;
        }
        let GestureState::Drawing { stroke } = std::mem::take(&mut self.state) else {
            return None;
        };
        log::debug!("Gesture drawing -> idle");
        if stroke.len() < 2 {
            log::trace!("Discarding stroke with {} point(s)", stroke.len());
            return None;
        }
        let recorded = board.record_history();
        let id = board.scene_mut().add_stroke(stroke);
        board.emit(BoardEvent::StrokeCreated(id));
        board.announce_step(recorded);
        Some(id)
    }

    fn begin_erase(&mut self, board: &mut Board, screen: Point) {
        self.end_active(board);
        board.begin_pending();
        self.set_state(GestureState::Erasing { erased: Vec::new() });
        let world = board.screen_to_world(screen);
        self.erase_at(board, world);
    }

    /// Remove every stroke with a point within the eraser radius of a world
    /// point. Outside an eraser gesture this records its own undo step.
    pub fn erase_at(&mut self, board: &mut Board, world: Point) -> Vec<StrokeId> {
        let radius = board.viewport.screen_dist_to_world(board.config().eraser_radius_px);
        let hits: Vec<StrokeId> = board
            .scene()
            .strokes()
            .filter(|stroke| stroke.has_point_near(world, radius))
            .map(Stroke::id)
            .collect();
        if hits.is_empty() {
            return hits;
        }

        let in_gesture = matches!(self.state, GestureState::Erasing { .. });
        let recorded = !in_gesture && board.record_history();
        board.scene_mut().remove_entities(&hits);
        if let GestureState::Erasing { erased } = &mut self.state {
            erased.extend_from_slice(&hits);
        }
        log::debug!("Erased {} stroke(s)", hits.len());
        board.emit(BoardEvent::StrokesErased(hits.clone()));
        board.announce_step(recorded);
        hits
    }

    fn end_erase(&mut self, board: &mut Board) {
        if !matches!(self.state, GestureState::Erasing { .. }) {
            return;
        }
        let GestureState::Erasing { erased } = std::mem::take(&mut self.state) else {
            return;
        };
        log::debug!("Gesture erasing -> idle");
        if erased.is_empty() {
            board.discard_pending();
        } else {
            board.commit_pending();
        }
    }
}

fn select_unless_selected(scene: &mut SceneStore, id: EntityId) {
    if !scene.is_selected(id) {
        scene.select(id);
    }
}

fn capture_origin(scene: &SceneStore, id: EntityId, origins: &mut HashMap<EntityId, Origin>) {
    if origins.contains_key(&id) {
        return;
    }
    if let Some(node) = scene.node(id) {
        origins.insert(id, Origin::Node(node.position));
    } else if let Some(stroke) = scene.stroke(id) {
        origins.insert(id, Origin::Stroke(stroke.points.clone()));
    }
}
