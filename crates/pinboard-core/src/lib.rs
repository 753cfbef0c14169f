//! Pinboard Core Library
//!
//! Gesture engine and spatial model for the pinboard canvas: viewport
//! transform, hit-testing, drag/resize/rotate gestures, connections,
//! freehand strokes, frame grouping and undo.

pub mod board;
pub mod config;
pub mod entities;
pub mod error;
pub mod gesture;
pub mod grouping;
pub mod handles;
pub mod hit;
pub mod history;
pub mod input;
pub mod scene;
pub mod viewport;

pub use board::{Board, BoardEvent, DrawTool, DrawingMode};
pub use config::EngineConfig;
pub use entities::{
    Color, Edge, EdgeId, EdgeStyle, EntityId, Node, NodeId, NodeKind, Stroke, StrokeId,
};
pub use error::{ConfigError, SceneError, SceneResult};
pub use gesture::{GestureController, GestureState, MoveGesture};
pub use handles::{HandleKind, ResizeHandle};
pub use hit::Hit;
pub use history::HistoryManager;
pub use input::{Modifiers, MouseButton, PointerEvent, PointerInput};
pub use scene::{EntityKind, Removed, SceneStore};
pub use viewport::Viewport;
