//! Freehand strokes.

use super::{Color, StrokeId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A freehand polyline drawn in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    /// Points in drawing order.
    pub points: Vec<Point>,
    pub color: Color,
}

impl Stroke {
    /// Start a stroke at `start`.
    pub fn new(start: Point, color: Color) -> Self {
        Self::from_points(vec![start], color)
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            color,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of all points, `None` when empty.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.points.split_first()?;
        Some(
            rest.iter()
                .fold(Rect::from_points(*first, *first), |rect, &p| rect.union_pt(p)),
        )
    }

    /// Whether `point` lies strictly within `threshold` of the polyline.
    ///
    /// A single-point stroke is tested by point distance.
    pub fn hit_test(&self, point: Point, threshold: f64) -> bool {
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance(point) < threshold,
            points => points
                .windows(2)
                .any(|pair| distance_to_segment(point, pair[0], pair[1]) < threshold),
        }
    }

    /// Whether any recorded point lies within `radius` of `point`.
    pub fn has_point_near(&self, point: Point, radius: f64) -> bool {
        self.points.iter().any(|p| p.distance(point) < radius)
    }

    /// Move every point by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }
}

/// Distance from `point` to the segment `start..end`.
pub(crate) fn distance_to_segment(point: Point, start: Point, end: Point) -> f64 {
    let line_vec = end - start;
    let line_len_sq = line_vec.hypot2();
    if line_len_sq < f64::EPSILON {
        // Degenerate segment
        return point.distance(start);
    }

    let t = ((point - start).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    point.distance(start + line_vec * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal() -> Stroke {
        Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)],
            Color::black(),
        )
    }

    #[test]
    fn test_hit_test_segments() {
        let stroke = horizontal();
        assert!(stroke.hit_test(Point::new(50.0, 5.0), 10.0));
        assert!(stroke.hit_test(Point::new(105.0, 50.0), 10.0));
        assert!(!stroke.hit_test(Point::new(50.0, 50.0), 10.0));
        // Beyond the end cap
        assert!(!stroke.hit_test(Point::new(-15.0, 0.0), 10.0));
    }

    #[test]
    fn test_single_point_hit() {
        let stroke = Stroke::new(Point::new(10.0, 10.0), Color::black());
        assert!(stroke.hit_test(Point::new(13.0, 14.0), 6.0));
        assert!(!stroke.hit_test(Point::new(13.0, 14.0), 5.0));
    }

    #[test]
    fn test_has_point_near_ignores_segment_interior() {
        let stroke = horizontal();
        assert!(stroke.has_point_near(Point::new(95.0, 5.0), 20.0));
        assert!(!stroke.has_point_near(Point::new(50.0, 0.0), 20.0));
    }

    #[test]
    fn test_translate_and_bounds() {
        let mut stroke = horizontal();
        stroke.translate(Vec2::new(10.0, -10.0));
        let bounds = stroke.bounds().unwrap();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 90.0).abs() < f64::EPSILON);
        assert!(Stroke::from_points(Vec::new(), Color::black()).bounds().is_none());
    }
}
