//! 2D vector and affine transform helpers.
//!
//! Everything runs in `f64` on top of nalgebra (re-exported by rapier2d).
//! Screen coordinates are used throughout: +x right, +y down, so "up" is
//! `(0, -1)` and a positive rotation turns clockwise on screen.

use std::ops::Mul;

pub use rapier2d::na;

/// Position, velocity or scale.
pub type Vec2 = na::Vector2<f64>;

/// A point in local or world space.
pub type Point = na::Point2<f64>;

/// Determinants at or below this magnitude are treated as singular.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

/// `(0, -1)`: the direction an unrotated entity faces.
pub fn up() -> Vec2 {
    Vec2::new(0.0, -1.0)
}

/// Rotate `v` by `angle` radians.
pub fn rotated(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Facing direction of something rotated by `rotation`.
pub fn direction(rotation: f64) -> Vec2 {
    rotated(up(), rotation)
}

/// Polar angle of `v` (`atan2(y, x)`).
pub fn angle(v: Vec2) -> f64 {
    v.y.atan2(v.x)
}

/// Vector of length `magnitude` pointing along `angle`.
pub fn from_polar(magnitude: f64, angle: f64) -> Vec2 {
    Vec2::new(magnitude * angle.cos(), magnitude * angle.sin())
}

/// Unit vector along `v`, or zero for a zero vector.
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    let n = v.norm();
    if n > 0.0 {
        v / n
    } else {
        Vec2::zeros()
    }
}

pub fn lerp(from: Vec2, to: Vec2, t: f64) -> Vec2 {
    from + (to - from) * t
}

// ---------------------------------------------------------------------------
// Transform2D
// ---------------------------------------------------------------------------

/// A 2D affine transform stored as a homogeneous 3x3 matrix.
///
/// `a * b` applies `b` first, then `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D(na::Matrix3<f64>);

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub fn identity() -> Self {
        Self(na::Matrix3::identity())
    }

    pub fn translation(offset: Vec2) -> Self {
        Self(na::Matrix3::new_translation(&offset))
    }

    /// Rotation about the origin.
    pub fn rotation(angle: f64) -> Self {
        Self(na::Matrix3::new_rotation(angle))
    }

    /// Rotation by `angle` about `pivot`.
    pub fn rotation_about(pivot: Point, angle: f64) -> Self {
        Self::translation(pivot.coords) * Self::rotation(angle) * Self::translation(-pivot.coords)
    }

    pub fn scaling(scale: Vec2) -> Self {
        Self(na::Matrix3::new_nonuniform_scaling(&scale))
    }

    pub fn from_matrix(m: na::Matrix3<f64>) -> Self {
        Self(m)
    }

    pub fn matrix(&self) -> &na::Matrix3<f64> {
        &self.0
    }

    pub fn apply(&self, p: &Point) -> Point {
        self.0.transform_point(p)
    }

    pub fn apply_vector(&self, v: &Vec2) -> Vec2 {
        self.0.transform_vector(v)
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
    }

    /// Numeric inverse, `None` when the linear part is singular.
    pub fn try_inverse(&self) -> Option<Self> {
        if self.determinant().abs() <= DEGENERATE_EPSILON {
            return None;
        }
        self.0.try_inverse().map(Self)
    }

    /// Element-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl Mul for Transform2D {
    type Output = Transform2D;

    fn mul(self, rhs: Transform2D) -> Transform2D {
        Transform2D(self.0 * rhs.0)
    }
}
