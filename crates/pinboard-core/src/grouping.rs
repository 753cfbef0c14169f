//! Frame membership: which frame a node belongs to after it moves.

use crate::entities::{Node, NodeId};
use crate::hit::point_in_rect;
use crate::scene::SceneStore;
use kurbo::Rect;

/// A change of a node's parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reparent {
    pub node: NodeId,
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
}

/// Frame whose unrotated box contains the center of `node`.
///
/// Frames are checked back to front and the last match wins, so the
/// topmost frame takes the node when frames overlap.
pub fn containing_frame(scene: &SceneStore, node: &Node) -> Option<NodeId> {
    let center = node.center();
    scene
        .frames()
        .filter(|frame| frame.id() != node.id())
        .filter(|frame| point_in_rect(center, frame.bounds()))
        .last()
        .map(Node::id)
}

/// Recompute the parent frame of `node_id` and apply it if it changed.
///
/// Frames are never re-parented here. Returns the change, or `None` when
/// nothing was mutated.
pub fn resolve(scene: &mut SceneStore, node_id: NodeId) -> Option<Reparent> {
    let node = scene.node(node_id)?;
    if node.is_frame() {
        return None;
    }
    let from = node.parent_id();
    let to = containing_frame(scene, node);
    if from == to {
        return None;
    }
    // A non-frame cannot be an ancestor, so this never forms a cycle
    scene.node_mut(node_id)?.parent_id = to;
    log::debug!("Node {node_id} reparented from {from:?} to {to:?}");
    Some(Reparent {
        node: node_id,
        from,
        to,
    })
}

/// Padded box around the rotated extents of the given nodes; `None` if none
/// of them exist.
pub fn enclosing_rect(scene: &SceneStore, ids: &[NodeId], padding: f64) -> Option<Rect> {
    ids.iter()
        .filter_map(|&id| scene.node(id))
        .map(Node::rotated_bounds)
        .reduce(|acc, rect| acc.union(rect))
        .map(|rect| rect.inflate(padding, padding))
}
