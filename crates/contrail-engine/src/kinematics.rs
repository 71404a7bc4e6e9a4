//! Velocity, acceleration and spin, integrated once per tick.
//!
//! Each tick, for a step of `dt` seconds:
//!
//! 1. `rotation += angular_velocity * dt`
//! 2. `velocity = clamp(velocity + acceleration * dt)`
//! 3. `last_velocity = velocity`, `position += last_velocity * dt`,
//!    `last_position = position`
//! 4. optionally, [`wrap_into`] the playfield
//!
//! The speed cap holds after *every* mutation: [`Kinematics::set_velocity`]
//! and [`Kinematics::set_max_speed`] both re-clamp immediately.

use crate::body::Body;
use crate::config::Playfield;
use crate::math::{Point, Vec2};
use crate::shape::TransformedShape;

/// Motion state of a moving entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Kinematics {
    velocity: Vec2,
    pub acceleration: Vec2,
    pub angular_velocity: f64,
    /// Negative means uncapped.
    max_speed: f64,
    last_position: Vec2,
    last_velocity: Vec2,
}

impl Kinematics {
    pub fn new(max_speed: f64) -> Self {
        Self {
            velocity: Vec2::zeros(),
            acceleration: Vec2::zeros(),
            angular_velocity: 0.0,
            max_speed,
            last_position: Vec2::zeros(),
            last_velocity: Vec2::zeros(),
        }
    }

    /// Start with `velocity`, clamped to `max_speed`.
    pub fn with_velocity(max_speed: f64, velocity: Vec2) -> Self {
        let mut k = Self::new(max_speed);
        k.set_velocity(velocity);
        k
    }

    /// No speed cap.
    pub fn uncapped() -> Self {
        Self::new(-1.0)
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Set velocity, rescaling it to `max_speed` if it is longer.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = clamp_speed(velocity, self.max_speed);
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Change the cap and re-clamp the current velocity against it.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        self.max_speed = max_speed;
        self.set_velocity(self.velocity);
    }

    /// Position at the end of the last integration step.
    pub fn last_position(&self) -> Vec2 {
        self.last_position
    }

    /// Velocity used in the last integration step. Collision reactions read
    /// this so that both sides of a contact see the pre-contact motion.
    pub fn last_velocity(&self) -> Vec2 {
        self.last_velocity
    }

    /// Advance `body` by `dt` seconds.
    pub fn integrate(&mut self, body: &mut Body, dt: f64) {
        body.rotation += self.angular_velocity * dt;
        self.set_velocity(self.velocity + self.acceleration * dt);
        self.last_velocity = self.velocity;
        body.position += self.last_velocity * dt;
        self.last_position = body.position;
    }
}

fn clamp_speed(v: Vec2, max_speed: f64) -> Vec2 {
    if max_speed < 0.0 {
        return v;
    }
    let speed = v.norm();
    if speed > max_speed {
        v * (max_speed / speed)
    } else {
        v
    }
}

/// Wrap `body` to the opposite edge once its outline has left `playfield`
/// entirely. Returns `true` if the body moved.
pub fn wrap_into(body: &mut Body, playfield: &Playfield) -> bool {
    let field = TransformedShape::world_rect(
        Point::origin(),
        Point::new(playfield.width, playfield.height),
    );
    if body.transformed_shape().intersects(&field) {
        return false;
    }
    body.position = Vec2::new(
        body.position.x.rem_euclid(playfield.width),
        body.position.y.rem_euclid(playfield.height),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use std::sync::Arc;

    fn body_at(x: f64, y: f64) -> Body {
        Body::new(Vec2::new(x, y), Arc::new(Shape::rect(10.0, 10.0).unwrap()), 0, 0)
    }

    #[test]
    fn set_velocity_clamps_to_max_speed() {
        let mut k = Kinematics::new(500.0);
        k.set_velocity(Vec2::new(100_000.0, 0.0));
        assert_eq!(k.velocity(), Vec2::new(500.0, 0.0));
    }

    #[test]
    fn lowering_max_speed_reclamps_immediately() {
        let mut k = Kinematics::new(500.0);
        k.set_velocity(Vec2::new(100_000.0, 0.0));
        k.set_max_speed(250.0);
        assert_eq!(k.velocity(), Vec2::new(250.0, 0.0));
    }

    #[test]
    fn negative_max_speed_is_uncapped() {
        let mut k = Kinematics::uncapped();
        k.set_velocity(Vec2::new(1e6, -1e6));
        assert_eq!(k.velocity(), Vec2::new(1e6, -1e6));
    }

    #[test]
    fn integrate_applies_steps_in_order() {
        let mut body = body_at(0.0, 0.0);
        let mut k = Kinematics::new(-1.0);
        k.set_velocity(Vec2::new(10.0, 0.0));
        k.acceleration = Vec2::new(0.0, 20.0);
        k.angular_velocity = 2.0;

        k.integrate(&mut body, 0.5);

        assert_eq!(body.rotation, 1.0);
        assert_eq!(k.velocity(), Vec2::new(10.0, 10.0));
        assert_eq!(k.last_velocity(), Vec2::new(10.0, 10.0));
        assert_eq!(body.position, Vec2::new(5.0, 5.0));
        assert_eq!(k.last_position(), body.position);
    }

    #[test]
    fn acceleration_cannot_exceed_cap() {
        let mut body = body_at(0.0, 0.0);
        let mut k = Kinematics::new(300.0);
        k.acceleration = Vec2::new(0.0, -1e5);
        for _ in 0..10 {
            k.integrate(&mut body, 0.02);
            assert!(k.velocity().norm() <= 300.0 + 1e-9);
        }
    }

    #[test]
    fn wrap_only_after_leaving_playfield() {
        let field = Playfield { width: 100.0, height: 50.0 };

        let mut inside = body_at(95.0, 10.0);
        assert!(!wrap_into(&mut inside, &field));
        assert_eq!(inside.position, Vec2::new(95.0, 10.0));

        let mut outside = body_at(104.0, 10.0);
        assert!(wrap_into(&mut outside, &field));
        assert!((outside.position - Vec2::new(4.0, 10.0)).norm() < 1e-9);

        let mut above = body_at(20.0, -12.0);
        assert!(wrap_into(&mut above, &field));
        assert!((above.position - Vec2::new(20.0, 38.0)).norm() < 1e-9);
    }
}
