//! Pointer input as delivered by the host.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// One pointer sample in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub position: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(position: Point, button: MouseButton, modifiers: Modifiers) -> Self {
        Self {
            position,
            button,
            modifiers,
        }
    }

    /// Left button without modifiers.
    pub fn left(x: f64, y: f64) -> Self {
        Self::new(Point::new(x, y), MouseButton::Left, Modifiers::default())
    }

    /// Middle button without modifiers.
    pub fn middle(x: f64, y: f64) -> Self {
        Self::new(Point::new(x, y), MouseButton::Middle, Modifiers::default())
    }

    /// Same sample with shift held.
    pub fn with_shift(mut self) -> Self {
        self.modifiers.shift = true;
        self
    }
}

/// Pointer event for unified dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(PointerInput),
    Move(PointerInput),
    Up(PointerInput),
    /// Wheel scroll at a screen anchor; positive `delta_y` scrolls down.
    Wheel { position: Point, delta_y: f64 },
    DoubleClick(PointerInput),
}
