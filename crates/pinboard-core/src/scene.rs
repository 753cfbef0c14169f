//! Scene store: nodes, edges, strokes and the selection.

use crate::entities::{Edge, EdgeId, EntityId, Node, NodeId, Stroke, StrokeId, normalize_degrees};
use crate::error::{SceneError, SceneResult};
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Which collection an entity id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Edge,
    Stroke,
}

/// Everything a delete removed, including cascaded edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removed {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
    pub strokes: Vec<StrokeId>,
    /// Nodes whose parent frame was deleted.
    pub orphaned: Vec<NodeId>,
}

impl Removed {
    /// All removed ids.
    pub fn ids(&self) -> Vec<EntityId> {
        self.nodes
            .iter()
            .chain(&self.edges)
            .chain(&self.strokes)
            .copied()
            .collect()
    }
}

/// Deep copy of the scene content, without the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    nodes: HashMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    edges: Vec<Edge>,
    strokes: HashMap<StrokeId, Stroke>,
    stroke_order: Vec<StrokeId>,
}

/// Serialized form: entities in z-order, back to front.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SceneData {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    strokes: Vec<Stroke>,
}

/// Holds every entity on the board plus the current selection.
///
/// Nodes and strokes are indexed by id with a separate z-order vector
/// (back to front). Removal always prunes references to the removed
/// entities: edges, parent links and selection.
#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    nodes: HashMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    edges: Vec<Edge>,
    strokes: HashMap<StrokeId, Stroke>,
    stroke_order: Vec<StrokeId>,
    selection: HashSet<EntityId>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Which collection `id` lives in, if any.
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        if self.nodes.contains_key(&id) {
            Some(EntityKind::Node)
        } else if self.strokes.contains_key(&id) {
            Some(EntityKind::Stroke)
        } else if self.edge(id).is_some() {
            Some(EntityKind::Edge)
        } else {
            None
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.kind_of(id).is_some()
    }

    // --- nodes ---

    /// Add a node on top of the z-order.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        if self.nodes.insert(id, node).is_none() {
            self.node_order.push(id);
        }
        id
    }

    /// Add a node underneath every other node.
    pub fn add_node_at_bottom(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.node_order.retain(|&other| other != id);
        self.node_order.insert(0, id);
        self.nodes.insert(id, node);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes back to front.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Frames back to front.
    pub fn frames(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes().filter(|node| node.is_frame())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct children of `frame`.
    pub fn children_of(&self, frame: NodeId) -> Vec<NodeId> {
        self.nodes()
            .filter(|node| node.parent_id() == Some(frame))
            .map(Node::id)
            .collect()
    }

    /// All nodes transitively parented to `frame`, excluding `frame` itself.
    pub fn descendants_of(&self, frame: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut seen = HashSet::from([frame]);
        let mut stack = vec![frame];
        while let Some(current) = stack.pop() {
            for child in self.children_of(current) {
                if seen.insert(child) {
                    found.push(child);
                    stack.push(child);
                }
            }
        }
        found
    }

    /// Whether `ancestor` appears on the parent chain above `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.node(node).and_then(Node::parent_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.node(id).and_then(Node::parent_id);
        }
        false
    }

    /// Assign `node` to `frame`, or detach it with `None`.
    ///
    /// Fails if either node is missing, the parent is not a frame, or the
    /// assignment would make a node its own ancestor.
    pub fn set_parent(&mut self, node: NodeId, frame: Option<NodeId>) -> SceneResult<()> {
        if !self.nodes.contains_key(&node) {
            return Err(SceneError::NodeNotFound(node));
        }
        if let Some(frame_id) = frame {
            let parent = self.node(frame_id).ok_or(SceneError::NodeNotFound(frame_id))?;
            if !parent.is_frame() {
                return Err(SceneError::NotAFrame(frame_id));
            }
            if frame_id == node || self.is_ancestor(node, frame_id) {
                return Err(SceneError::ParentCycle {
                    child: node,
                    frame: frame_id,
                });
            }
        }
        if let Some(child) = self.nodes.get_mut(&node) {
            child.parent_id = frame;
        }
        Ok(())
    }

    // --- edges ---

    /// Add an edge if both endpoints exist and differ.
    pub fn add_edge(&mut self, edge: Edge) -> Option<EdgeId> {
        if edge.from == edge.to
            || !self.nodes.contains_key(&edge.from)
            || !self.nodes.contains_key(&edge.to)
        {
            return None;
        }
        let id = edge.id();
        self.edges.push(edge);
        Some(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id() == id)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|edge| edge.id() == id)
    }

    /// Edges in creation order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    // --- strokes ---

    /// Add a stroke on top of the other strokes.
    pub fn add_stroke(&mut self, stroke: Stroke) -> StrokeId {
        let id = stroke.id();
        if self.strokes.insert(id, stroke).is_none() {
            self.stroke_order.push(id);
        }
        id
    }

    pub fn stroke(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(&id)
    }

    pub fn stroke_mut(&mut self, id: StrokeId) -> Option<&mut Stroke> {
        self.strokes.get_mut(&id)
    }

    /// Strokes back to front.
    pub fn strokes(&self) -> impl DoubleEndedIterator<Item = &Stroke> {
        self.stroke_order.iter().filter_map(|id| self.strokes.get(id))
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// Remove every stroke, returning the removed ids.
    pub fn clear_strokes(&mut self) -> Vec<StrokeId> {
        let removed = std::mem::take(&mut self.stroke_order);
        self.strokes.clear();
        self.selection.retain(|id| !removed.contains(id));
        removed
    }

    // --- editing ---

    /// Move a node or stroke by a world-space delta. Returns false if the
    /// id is not a movable entity.
    pub fn translate(&mut self, id: EntityId, delta: Vec2) -> bool {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.translate(delta);
            true
        } else if let Some(stroke) = self.strokes.get_mut(&id) {
            stroke.translate(delta);
            true
        } else {
            false
        }
    }

    /// Remove entities of any kind, cascading to edges attached to removed
    /// nodes and clearing parent links that pointed at removed frames.
    pub fn remove_entities(&mut self, ids: &[EntityId]) -> Removed {
        let mut removed = Removed::default();
        let targets: HashSet<EntityId> = ids.iter().copied().collect();

        for &id in ids {
            if self.nodes.remove(&id).is_some() {
                removed.nodes.push(id);
            } else if self.strokes.remove(&id).is_some() {
                removed.strokes.push(id);
            }
        }
        self.node_order.retain(|id| !targets.contains(id));
        self.stroke_order.retain(|id| !targets.contains(id));

        let removed_nodes: HashSet<NodeId> = removed.nodes.iter().copied().collect();
        self.edges.retain(|edge| {
            let drop = targets.contains(&edge.id())
                || removed_nodes.contains(&edge.from)
                || removed_nodes.contains(&edge.to);
            if drop {
                removed.edges.push(edge.id());
            }
            !drop
        });

        for node in self.nodes.values_mut() {
            if node.parent_id.is_some_and(|parent| removed_nodes.contains(&parent)) {
                node.parent_id = None;
                removed.orphaned.push(node.id());
            }
        }

        self.selection.retain(|id| !targets.contains(id) && !removed.edges.contains(id));
        removed
    }

    // --- selection ---

    pub fn selection(&self) -> &HashSet<EntityId> {
        &self.selection
    }

    /// Selected ids in a stable order: nodes and strokes by z-order, then
    /// edges.
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.node_order
            .iter()
            .chain(&self.stroke_order)
            .copied()
            .chain(self.edges.iter().map(Edge::id))
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selection.contains(&id)
    }

    /// Replace the selection with `id`.
    pub fn select(&mut self, id: EntityId) {
        self.selection.clear();
        self.add_to_selection(id);
    }

    /// Add `id` if it exists.
    pub fn add_to_selection(&mut self, id: EntityId) {
        if self.contains(id) {
            self.selection.insert(id);
        }
    }

    /// Flip membership of `id`.
    pub fn toggle_selection(&mut self, id: EntityId) {
        if !self.selection.remove(&id) {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select every node, edge and stroke.
    pub fn select_all(&mut self) {
        self.selection = self
            .node_order
            .iter()
            .chain(&self.stroke_order)
            .copied()
            .chain(self.edges.iter().map(Edge::id))
            .collect();
    }

    // --- snapshots & serialization ---

    /// Deep copy of nodes, edges and strokes.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            nodes: self.nodes.clone(),
            node_order: self.node_order.clone(),
            edges: self.edges.clone(),
            strokes: self.strokes.clone(),
            stroke_order: self.stroke_order.clone(),
        }
    }

    /// Replace the content with `snapshot` and clear the selection.
    pub fn restore(&mut self, snapshot: SceneSnapshot) {
        self.nodes = snapshot.nodes;
        self.node_order = snapshot.node_order;
        self.edges = snapshot.edges;
        self.strokes = snapshot.strokes;
        self.stroke_order = snapshot.stroke_order;
        self.selection.clear();
    }

    /// Bounding box of all content, using rotated node extents.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes()
            .map(Node::rotated_bounds)
            .chain(self.strokes().filter_map(Stroke::bounds))
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Serialize the scene content (not the selection) to JSON.
    pub fn to_json(&self) -> SceneResult<String> {
        let data = SceneData {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges.clone(),
            strokes: self.strokes().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Load a scene from JSON, repairing anything that breaks the scene
    /// invariants.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let data: SceneData = serde_json::from_str(json)?;
        let mut scene = Self::new();
        for mut node in data.nodes {
            node.rotation = normalize_degrees(node.rotation);
            scene.add_node(node);
        }
        for stroke in data.strokes {
            if !stroke.is_empty() {
                scene.add_stroke(stroke);
            }
        }
        for edge in data.edges {
            if scene.add_edge(edge).is_none() {
                log::warn!("Dropping edge with missing or identical endpoints");
            }
        }
        scene.repair_parents();
        Ok(scene)
    }

    /// Clear parent links that point at missing nodes, non-frames, or form a
    /// cycle.
    fn repair_parents(&mut self) {
        let order = self.node_order.clone();
        for id in order {
            let parent = self.nodes.get(&id).and_then(Node::parent_id);
            let Some(parent) = parent else { continue };
            let valid = parent != id
                && self.nodes.get(&parent).is_some_and(Node::is_frame)
                && !self.is_ancestor(id, id);
            if !valid {
                log::warn!("Clearing invalid parent {parent} of node {id}");
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.parent_id = None;
                }
            }
        }
    }
}
