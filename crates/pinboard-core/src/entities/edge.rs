//! Connections between nodes.

use super::{Color, EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Line style of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
}

/// A string stretched between the pins of two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    /// Overrides the default string color.
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub style: EdgeStyle,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            color: None,
            style: EdgeStyle::Solid,
        }
    }

    /// New edge between other endpoints that keeps this edge's look.
    pub fn restyled(&self, from: NodeId, to: NodeId) -> Self {
        Self {
            color: self.color,
            style: self.style,
            ..Self::new(from, to)
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Whether this edge links `a` and `b` in either direction.
    pub fn links(&self, a: NodeId, b: NodeId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restyled_keeps_look() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut edge = Edge::new(a, b);
        edge.style = EdgeStyle::Dashed;
        edge.color = Some(Color::black());

        let split = edge.restyled(a, c);
        assert_ne!(split.id(), edge.id());
        assert_eq!(split.style, EdgeStyle::Dashed);
        assert_eq!(split.color, Some(Color::black()));
        assert_eq!((split.from, split.to), (a, c));
        assert!(!split.links(a, b));
    }

    #[test]
    fn test_links_is_undirected() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let edge = Edge::new(a, b);
        assert!(edge.links(b, a));
        assert!(!edge.links(a, a));
    }
}
