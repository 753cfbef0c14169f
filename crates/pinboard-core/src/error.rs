//! Error types.
//!
//! Geometry and gestures never fail; these cover explicit grouping commands,
//! scene (de)serialization and configuration loading.

use crate::entities::NodeId;
use thiserror::Error;

/// Errors raised by explicit scene commands.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Node {0} is not a frame")]
    NotAFrame(NodeId),
    #[error("Assigning {child} to frame {frame} would create a parent cycle")]
    ParentCycle { child: NodeId, frame: NodeId },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for scene commands.
pub type SceneResult<T> = Result<T, SceneError>;
