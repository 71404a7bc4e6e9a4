//! Collision outlines and strict overlap tests.
//!
//! A [`Shape`] is a union of convex polygons in local space. Concave outlines
//! are expressed as a compound of convex parts. Once an entity's transform is
//! applied the result is a [`TransformedShape`], which is what the collision
//! pass and the screen-wrap check compare.
//!
//! Overlap is *strict*: two outlines intersect only when the shared region has
//! positive area. Shapes that merely share an edge or a corner do not collide.

use rapier2d::parry::shape::ConvexPolygon;

use crate::error::SimError;
use crate::math::{na, Point, Transform2D, Vec2};

/// Segments used to flatten an ellipse.
pub const ELLIPSE_SEGMENTS: usize = 32;

/// Projections closer than this (in world units) count as touching.
const TOUCH_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Point {
        na::center(&self.min, &self.max)
    }

    /// Strict overlap: touching boxes do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x < other.max.x - TOUCH_EPSILON
            && other.min.x < self.max.x - TOUCH_EPSILON
            && self.min.y < other.max.y - TOUCH_EPSILON
            && other.min.y < self.max.y - TOUCH_EPSILON
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Local-space collision outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    parts: Vec<Vec<Point>>,
    bounds: Bounds,
}

impl Shape {
    /// `width` x `height` rectangle with its top-left corner at the origin.
    pub fn rect(width: f64, height: f64) -> Result<Self, SimError> {
        Self::rect_at(0.0, 0.0, width, height)
    }

    /// Rectangle with its top-left corner at `(x, y)`.
    pub fn rect_at(x: f64, y: f64, width: f64, height: f64) -> Result<Self, SimError> {
        check_extent("rectangle", width, height)?;
        Ok(Self::from_parts(vec![vec![
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ]]))
    }

    /// Ellipse inscribed in the `width` x `height` box at `(x, y)`, flattened
    /// to [`ELLIPSE_SEGMENTS`] edges.
    pub fn ellipse(x: f64, y: f64, width: f64, height: f64) -> Result<Self, SimError> {
        check_extent("ellipse", width, height)?;
        let (rx, ry) = (width / 2.0, height / 2.0);
        let (cx, cy) = (x + rx, y + ry);
        let vertices = (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
                Point::new(cx + rx * t.cos(), cy + ry * t.sin())
            })
            .collect();
        Ok(Self::from_parts(vec![vertices]))
    }

    /// Convex hull of `points`.
    pub fn convex_hull(points: &[Point]) -> Result<Self, SimError> {
        let narrowed: Vec<na::Point2<f32>> = points
            .iter()
            .map(|p| na::Point2::new(p.x as f32, p.y as f32))
            .collect();
        let degenerate = || {
            SimError::config(format!(
                "convex hull of {} points is degenerate",
                points.len()
            ))
        };
        if narrowed.len() < 3 {
            return Err(degenerate());
        }
        let hull = ConvexPolygon::from_convex_hull(&narrowed).ok_or_else(degenerate)?;
        if hull.points().len() < 3 {
            return Err(degenerate());
        }
        let vertices = hull
            .points()
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect();
        Ok(Self::from_parts(vec![vertices]))
    }

    /// Union of several shapes.
    pub fn compound(shapes: Vec<Shape>) -> Result<Self, SimError> {
        if shapes.is_empty() {
            return Err(SimError::config("compound shape needs at least one part"));
        }
        Ok(Self::from_parts(
            shapes.into_iter().flat_map(|s| s.parts).collect(),
        ))
    }

    fn from_parts(parts: Vec<Vec<Point>>) -> Self {
        let bounds = Bounds::from_points(parts.iter().flatten());
        Self { parts, bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Convex parts, each a closed vertex loop.
    pub fn parts(&self) -> &[Vec<Point>] {
        &self.parts
    }

    pub fn transformed(&self, transform: &Transform2D) -> TransformedShape {
        TransformedShape::from_parts(
            self.parts
                .iter()
                .map(|part| part.iter().map(|p| transform.apply(p)).collect())
                .collect(),
        )
    }
}

fn check_extent(what: &str, width: f64, height: f64) -> Result<(), SimError> {
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err(SimError::config(format!(
            "{what} extent must be positive and finite, got {width}x{height}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TransformedShape
// ---------------------------------------------------------------------------

/// A shape after an entity transform has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedShape {
    parts: Vec<Vec<Point>>,
    bounds: Bounds,
}

impl TransformedShape {
    fn from_parts(parts: Vec<Vec<Point>>) -> Self {
        let bounds = Bounds::from_points(parts.iter().flatten());
        Self { parts, bounds }
    }

    /// Axis-aligned rectangle in world space.
    pub fn world_rect(min: Point, max: Point) -> Self {
        Self::from_parts(vec![vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ]])
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn parts(&self) -> &[Vec<Point>] {
        &self.parts
    }

    /// `true` when the two outlines share a region of positive area.
    pub fn intersects(&self, other: &TransformedShape) -> bool {
        if !self.bounds.overlaps(&other.bounds) {
            return false;
        }
        self.parts
            .iter()
            .any(|a| other.parts.iter().any(|b| convex_overlap(a, b)))
    }
}

/// Separating-axis test for two convex vertex loops.
///
/// Not parry's `intersection_test`: that works in f32 and reports touching
/// shapes as intersecting, while contact with zero area must not count here.
fn convex_overlap(a: &[Point], b: &[Point]) -> bool {
    !has_separating_axis(a, b) && !has_separating_axis(b, a)
}

fn has_separating_axis(poly: &[Point], other: &[Point]) -> bool {
    let n = poly.len();
    for i in 0..n {
        let edge = poly[(i + 1) % n] - poly[i];
        let len = edge.norm();
        if len == 0.0 {
            continue;
        }
        let axis = Vec2::new(-edge.y, edge.x) / len;
        let (a_min, a_max) = project(poly, &axis);
        let (b_min, b_max) = project(other, &axis);
        if a_max - b_min <= TOUCH_EPSILON || b_max - a_min <= TOUCH_EPSILON {
            return true;
        }
    }
    false
}

fn project(poly: &[Point], axis: &Vec2) -> (f64, f64) {
    poly.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = p.coords.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
