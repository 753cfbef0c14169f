//! Viewport transform for pan/zoom.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 5.0;

/// Maps world coordinates to screen coordinates.
///
/// `screen = world * scale + translate`. The scale is always kept inside
/// [`MIN_SCALE`, `MAX_SCALE`], including when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "ViewportData")]
pub struct Viewport {
    /// Pan offset in screen pixels.
    pub translate: Vec2,
    /// Zoom factor (1.0 = 100%).
    scale: f64,
}

/// Unchecked serialized form.
#[derive(Deserialize)]
struct ViewportData {
    translate: Vec2,
    scale: f64,
}

impl From<ViewportData> for Viewport {
    fn from(data: ViewportData) -> Self {
        let mut viewport = Self {
            translate: data.translate,
            ..Self::default()
        };
        viewport.set_scale(data.scale);
        viewport
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport with no pan and 100% zoom.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the zoom factor, clamped to [`MIN_SCALE`, `MAX_SCALE`].
    /// Non-finite values fall back to 100%.
    pub fn set_scale(&mut self, scale: f64) {
        self.scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
    }

    /// Transform converting world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }

    /// Transform converting screen coordinates to world coordinates.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.translate)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-space distance (pixels) to world units.
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Pan by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate += Vec2::new(dx, dy);
    }

    /// Change the scale by `scale_delta`, keeping the world point under
    /// `anchor` (screen coordinates) fixed on screen.
    pub fn zoom(&mut self, anchor: Point, scale_delta: f64) {
        if !scale_delta.is_finite() {
            return;
        }
        let new_scale = (self.scale + scale_delta).clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(anchor);
        self.scale = new_scale;

        // Shift so world_point lands back on the anchor
        let new_screen = self.world_to_screen(world_point);
        self.translate += anchor - new_screen;
    }

    /// Apply a wheel event: scrolling down (positive `delta_y`) zooms out.
    pub fn wheel(&mut self, anchor: Point, delta_y: f64, speed: f64) {
        self.zoom(anchor, -delta_y * speed);
    }

    /// Reset to no pan and 100% zoom.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fit the viewport so `bounds` fills a screen of `viewport_size`.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport_size: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport_size.width - padding * 2.0).max(1.0),
            (viewport_size.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(MIN_SCALE, MAX_SCALE);

        let bounds_center = bounds.center();
        let screen_center = Point::new(viewport_size.width / 2.0, viewport_size.height / 2.0);
        self.translate = Vec2::new(
            screen_center.x - bounds_center.x * self.scale,
            screen_center.y - bounds_center.y * self.scale,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::new();
        assert_eq!(viewport.translate, Vec2::ZERO);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_world_with_translate_and_scale() {
        let viewport = Viewport {
            translate: Vec2::new(50.0, 100.0),
            scale: 2.0,
        };
        let world = viewport.screen_to_world(Point::new(150.0, 300.0));
        assert_point_eq(world, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport {
            translate: Vec2::new(30.0, -20.0),
            scale: 1.5,
        };
        for &(x, y) in &[(0.0, 0.0), (123.0, 456.0), (-800.5, 13.25), (1e4, -1e4)] {
            let original = Point::new(x, y);
            let back = viewport.world_to_screen(viewport.screen_to_world(original));
            assert_point_eq(back, original);
        }
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport {
            translate: Vec2::new(40.0, -15.0),
            scale: 1.2,
        };
        let anchor = Point::new(320.0, 240.0);
        for delta in [0.5, -0.3, 2.0, -10.0, 10.0] {
            let before = viewport.screen_to_world(anchor);
            viewport.zoom(anchor, delta);
            let after = viewport.screen_to_world(anchor);
            assert_point_eq(before, after);
        }
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::new();
        viewport.zoom(Point::ZERO, -100.0);
        assert!((viewport.scale - MIN_SCALE).abs() < f64::EPSILON);

        viewport.zoom(Point::ZERO, 100.0);
        assert!((viewport.scale - MAX_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_ignores_non_finite_delta() {
        let mut viewport = Viewport::new();
        viewport.zoom(Point::new(10.0, 10.0), f64::NAN);
        assert_eq!(viewport, Viewport::new());
    }

    #[test]
    fn test_wheel_down_zooms_out() {
        let mut viewport = Viewport::new();
        viewport.wheel(Point::ZERO, 100.0, 0.001);
        assert!((viewport.scale - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::new();
        viewport.pan(10.0, 20.0);
        viewport.pan(-4.0, 1.0);
        assert!((viewport.translate.x - 6.0).abs() < f64::EPSILON);
        assert!((viewport.translate.y - 21.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_clamps_scale() {
        let viewport: Viewport =
            serde_json::from_str(r#"{"translate":{"x":5.0,"y":-5.0},"scale":0.0}"#).unwrap();
        assert!((viewport.scale() - MIN_SCALE).abs() < f64::EPSILON);
        assert_eq!(viewport.translate, Vec2::new(5.0, -5.0));
        assert!(viewport.screen_to_world(Point::new(10.0, 10.0)).is_finite());

        let viewport: Viewport =
            serde_json::from_str(r#"{"translate":{"x":0.0,"y":0.0},"scale":80.0}"#).unwrap();
        assert!((viewport.scale() - MAX_SCALE).abs() < f64::EPSILON);

        let json = serde_json::to_string(&viewport).unwrap();
        assert_eq!(serde_json::from_str::<Viewport>(&json).unwrap(), viewport);
    }

    #[test]
    fn test_set_scale_clamps() {
        let mut viewport = Viewport::new();
        viewport.set_scale(0.01);
        assert!((viewport.scale() - MIN_SCALE).abs() < f64::EPSILON);
        viewport.set_scale(f64::INFINITY);
        assert!((viewport.scale() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut viewport = Viewport::new();
        let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
        viewport.fit_to_bounds(bounds, Size::new(800.0, 600.0), 0.0);
        assert!((viewport.scale - 2.0).abs() < 1e-9);
        assert_point_eq(viewport.world_to_screen(bounds.center()), Point::new(400.0, 300.0));
    }
}
