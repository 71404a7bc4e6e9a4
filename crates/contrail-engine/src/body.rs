//! Placement, outline and collision filter of an entity.

use std::sync::Arc;

use crate::math::{Point, Transform2D, Vec2};
use crate::shape::{Shape, TransformedShape};

/// Collision layer bits used by the built-in entity roles.
pub mod layers {
    pub const PLAYER: u32 = 1;
    pub const ENEMY: u32 = 2;
    pub const PROJECTILE_1: u32 = 4;
    pub const PROJECTILE_2: u32 = 8;
    pub const PROJECTILE_ENEMY: u32 = 16;
    pub const POWERUP: u32 = 32;
}

/// Transform, outline and layer/mask pair.
///
/// `layer` says what the body is, `mask` says what it reacts to. Once
/// [`destroy`](Self::destroy) has been called both are zero and stay zero.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    /// Radians, clockwise on screen.
    pub rotation: f64,
    pub scale: Vec2,
    shape: Arc<Shape>,
    layer: u32,
    mask: u32,
    destroyed: bool,
}

impl Body {
    pub fn new(position: Vec2, shape: Arc<Shape>, layer: u32, mask: u32) -> Self {
        Self {
            position,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            shape,
            layer,
            mask,
            destroyed: false,
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn set_shape(&mut self, shape: Arc<Shape>) {
        self.shape = shape;
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Change the collision filter. Ignored once destroyed.
    pub fn set_filter(&mut self, layer: u32, mask: u32) {
        if !self.destroyed {
            self.layer = layer;
            self.mask = mask;
        }
    }

    /// Flag for removal and drop out of collision immediately.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.layer = 0;
        self.mask = 0;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// `true` if this body's mask selects `other`'s layer.
    pub fn reacts_to(&self, other: &Body) -> bool {
        self.mask & other.layer != 0
    }

    /// World-space center of the scaled local bounds.
    pub fn pivot(&self) -> Point {
        let b = self.shape.bounds();
        let center = b.min.coords + b.size() / 2.0;
        Point::from(self.position + self.scale.component_mul(&center))
    }

    /// Rotate about [`pivot`](Self::pivot), then translate, then scale.
    pub fn transform(&self) -> Transform2D {
        Transform2D::rotation_about(self.pivot(), self.rotation)
            * Transform2D::translation(self.position)
            * Transform2D::scaling(self.scale)
    }

    pub fn transformed_shape(&self) -> TransformedShape {
        self.shape.transformed(&self.transform())
    }

    /// Scaled width and height of the outline.
    pub fn size(&self) -> Vec2 {
        self.shape.bounds().size().component_mul(&self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_body(x: f64, y: f64) -> Body {
        Body::new(
            Vec2::new(x, y),
            Arc::new(Shape::rect(10.0, 10.0).unwrap()),
            layers::PLAYER,
            layers::PLAYER,
        )
    }

    #[test]
    fn destroy_zeroes_filter_and_sticks() {
        let mut body = square_body(0.0, 0.0);
        body.destroy();
        assert!(body.is_destroyed());
        assert_eq!((body.layer(), body.mask()), (0, 0));
        body.set_filter(layers::POWERUP, layers::PLAYER);
        assert_eq!((body.layer(), body.mask()), (0, 0));
    }

    #[test]
    fn rotation_turns_about_bounds_center() {
        let mut body = square_body(20.0, 30.0);
        body.rotation = std::f64::consts::FRAC_PI_2;
        let b = body.transformed_shape().bounds();
        // A square rotated about its own center covers the same box.
        assert!((b.min - Point::new(20.0, 30.0)).norm() < 1e-9);
        assert!((b.max - Point::new(30.0, 40.0)).norm() < 1e-9);
    }

    #[test]
    fn pivot_accounts_for_offset_outline_and_scale() {
        let body = Body::new(
            Vec2::new(100.0, 100.0),
            Arc::new(Shape::rect_at(-2.0, -5.0, 4.0, 10.0).unwrap()),
            0,
            0,
        )
        .with_scale(Vec2::new(2.0, 2.0));
        assert!((body.pivot() - Point::new(100.0, 100.0)).norm() < 1e-12);
        assert_eq!(body.size(), Vec2::new(8.0, 20.0));
    }

    #[test]
    fn reacts_to_uses_own_mask_only() {
        let a = Body::new(Vec2::zeros(), Arc::new(Shape::rect(1.0, 1.0).unwrap()), 1, 2);
        let b = Body::new(Vec2::zeros(), Arc::new(Shape::rect(1.0, 1.0).unwrap()), 2, 0);
        assert!(a.reacts_to(&b));
        assert!(!b.reacts_to(&a));
    }
}
