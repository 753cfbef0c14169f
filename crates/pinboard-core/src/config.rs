//! Tunable thresholds for the gesture engine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// Values suffixed `_px` are screen pixels, divided by the viewport scale
/// before use. Everything else is in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pointer travel before a pressed node becomes a drag.
    pub drag_threshold_px: f64,
    /// Hit corridor around freehand strokes.
    pub stroke_hit_px: f64,
    /// Radius of the stroke eraser.
    pub eraser_radius_px: f64,
    /// Hit corridor around connections.
    pub edge_hit_px: f64,
    /// Hit radius of resize and rotate handles.
    pub handle_radius_px: f64,
    /// Hit radius of connection pins.
    pub pin_radius_px: f64,
    /// Distance from the bottom edge of a node to its rotate handle.
    pub rotate_handle_offset: f64,
    /// Smallest width/height a resize may produce.
    pub min_node_size: f64,
    /// Margin added around nodes when grouping them into a new frame.
    pub frame_padding: f64,
    /// Maximum number of undo snapshots.
    pub history_limit: usize,
    /// Scale change per wheel delta unit.
    pub wheel_zoom_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            stroke_hit_px: 10.0,
            eraser_radius_px: 20.0,
            edge_hit_px: 6.0,
            handle_radius_px: 10.0,
            pin_radius_px: 10.0,
            rotate_handle_offset: 25.0,
            min_node_size: 100.0,
            frame_padding: 40.0,
            history_limit: 50,
            wheel_zoom_speed: 0.001,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every threshold is finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("drag_threshold_px", self.drag_threshold_px),
            ("stroke_hit_px", self.stroke_hit_px),
            ("eraser_radius_px", self.eraser_radius_px),
            ("edge_hit_px", self.edge_hit_px),
            ("handle_radius_px", self.handle_radius_px),
            ("pin_radius_px", self.pin_radius_px),
            ("rotate_handle_offset", self.rotate_handle_offset),
            ("min_node_size", self.min_node_size),
            ("frame_padding", self.frame_padding),
            ("wheel_zoom_speed", self.wheel_zoom_speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "drag_threshold_px": 8.0 }"#).unwrap();
        assert!((config.drag_threshold_px - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let err = EngineConfig::from_json(r#"{ "eraser_radius_px": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_json(r#"{ "history_limit": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = EngineConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
