//! Entities placed on the board: nodes, edges and strokes.

mod edge;
mod node;
mod stroke;

pub use edge::{Edge, EdgeStyle};
pub use node::{Node, NodeKind};
pub use stroke::Stroke;
pub(crate) use stroke::distance_to_segment;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier shared by every entity kind. UUIDs keep node, edge and stroke
/// ids unique across kinds, so one selection set can hold all of them.
pub type EntityId = Uuid;
/// Identifier of a [`Node`].
pub type NodeId = EntityId;
/// Identifier of an [`Edge`].
pub type EdgeId = EntityId;
/// Identifier of a [`Stroke`].
pub type StrokeId = EntityId;

/// RGBA8 color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// The red used for connection strings and pins.
    pub const fn string_red() -> Self {
        Self::new(0xd6, 0x30, 0x31, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Returns `None` for anything else.
    pub fn from_hex(color: &str) -> Option<Self> {
        let hex = color.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Some(Self::new(r, g, b, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Next value of a process-wide seed sequence, used for the tilt of new
/// notes. Splitmix-style mixing of a counter.
pub(crate) fn next_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut x = counter.wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    x
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let color = Color::from_hex("#d63031").unwrap();
        assert_eq!(color, Color::string_red());
        assert_eq!(color.to_hex(), "#d63031");
    }

    #[test]
    fn test_color_short_and_alpha_forms() {
        assert_eq!(Color::from_hex("#fff"), Some(Color::new(255, 255, 255, 255)));
        assert_eq!(Color::from_hex("#00000080"), Some(Color::new(0, 0, 0, 128)));
        assert_eq!(Color::new(0, 0, 0, 128).to_hex(), "#00000080");
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert_eq!(Color::from_hex("red"), None);
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(370.0) - 10.0).abs() < 1e-9);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-9);
        assert!(normalize_degrees(360.0).abs() < 1e-9);
        assert!(normalize_degrees(f64::NAN).abs() < f64::EPSILON);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_seeds_vary() {
        let a = next_seed();
        let b = next_seed();
        assert_ne!(a, b);
    }
}
