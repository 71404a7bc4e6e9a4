//! Trauma-driven procedural camera shake.
//!
//! Trauma is a saturating scalar in `[0, 1]`. While it is positive, each
//! update samples OpenSimplex noise on three decorrelated channels (roll, x,
//! y), scales the samples by `bound * trauma^power` and then lets trauma decay
//! linearly. Because the noise field is continuous the shake wanders instead
//! of jittering.

use std::fmt;

use noise::{NoiseFn, OpenSimplex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::config::{Playfield, ShakeConfig};
use crate::error::SimError;
use crate::math::{Point, Transform2D, Vec2};

pub struct ShakeCamera {
    config: ShakeConfig,
    viewport: Playfield,
    noise: OpenSimplex,
    noise_offset: f64,
    cursor: f64,
    trauma: f64,
    offset: Vec2,
    rotation: f64,
}

impl ShakeCamera {
    /// `seed` picks both the noise field and the channel offsets into it.
    pub fn new(config: ShakeConfig, viewport: Playfield, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let mut rng = Pcg64::seed_from_u64(seed);
        Ok(Self {
            config,
            viewport,
            noise: OpenSimplex::new(seed as u32),
            noise_offset: rng.gen_range(1000.0..101_000.0),
            cursor: 0.0,
            trauma: 0.0,
            offset: Vec2::zeros(),
            rotation: 0.0,
        })
    }

    /// Saturates at 1.0. Negative amounts are ignored; trauma only falls
    /// through decay.
    pub fn add_trauma(&mut self, amount: f64) {
        self.trauma = (self.trauma + amount.max(0.0)).min(1.0);
    }

    pub fn trauma(&self) -> f64 {
        self.trauma
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn update(&mut self, dt: f64) {
        if self.trauma <= 0.0 {
            return;
        }
        self.cursor += self.config.noise_step;
        let shake = self.trauma.powf(self.config.trauma_power);
        let ox = self.noise_offset;
        self.rotation = self.config.max_roll * shake * self.sample(ox);
        self.offset = Vec2::new(
            self.config.max_offset[0] * shake * self.sample(2.0 * ox),
            self.config.max_offset[1] * shake * self.sample(3.0 * ox),
        );
        self.trauma = (self.trauma - self.config.decay * dt).max(0.0);
    }

    fn sample(&self, channel: f64) -> f64 {
        self.noise.get([channel, self.cursor, 0.0]).clamp(-1.0, 1.0)
    }

    fn viewport_center(&self) -> Point {
        Point::from(self.viewport.center())
    }

    /// Roll about the viewport center after translating by the offset.
    pub fn transform(&self) -> Transform2D {
        Transform2D::rotation_about(self.viewport_center(), self.rotation)
            * Transform2D::translation(self.offset)
    }

    /// Exact inverse of [`transform`](Self::transform), built from the
    /// inverted steps in reverse order.
    pub fn inverse_transform(&self) -> Transform2D {
        Transform2D::translation(-self.offset)
            * Transform2D::rotation_about(self.viewport_center(), -self.rotation)
    }
}

impl fmt::Debug for ShakeCamera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShakeCamera")
            .field("trauma", &self.trauma)
            .field("offset", &self.offset)
            .field("rotation", &self.rotation)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}
