//! Simulation configuration.
//!
//! Every field has a default matching the stock dogfight setup, so a JSON
//! document only needs to name what it changes:
//!
//! ```
//! use contrail_engine::config::SimConfig;
//!
//! let cfg = SimConfig::from_json_str(r#"{ "tick_rate": 60, "game_speed": 0.5 }"#).unwrap();
//! assert_eq!(cfg.tick_rate, 60.0);
//! assert_eq!(cfg.playfield.width, 1068.0);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// Playfield
// ---------------------------------------------------------------------------

/// The rectangle `[0, width] x [0, height]` entities live in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f64,
    pub height: f64,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1068.0,
            height: 700.0,
        }
    }
}

impl Playfield {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

// ---------------------------------------------------------------------------
// ShakeConfig
// ---------------------------------------------------------------------------

/// Tuning for the trauma-driven camera shake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Trauma lost per second.
    pub decay: f64,
    /// Offset amplitude per axis at full trauma.
    pub max_offset: [f64; 2],
    /// Roll amplitude (radians) at full trauma.
    pub max_roll: f64,
    /// Exponent applied to trauma before scaling.
    pub trauma_power: f64,
    /// Noise cursor advance per shaking update.
    pub noise_step: f64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            decay: 0.8,
            max_offset: [3.0, 2.0],
            max_roll: 0.02,
            trauma_power: 2.0,
            noise_step: 1.0,
        }
    }
}

impl ShakeConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.decay >= 0.0 && self.decay.is_finite()) {
            return Err(SimError::config(format!(
                "camera decay must be non-negative, got {}",
                self.decay
            )));
        }
        if !(self.noise_step > 0.0 && self.noise_step.is_finite()) {
            return Err(SimError::config(format!(
                "camera noise_step must be positive, got {}",
                self.noise_step
            )));
        }
        if !self.trauma_power.is_finite() || self.trauma_power <= 0.0 {
            return Err(SimError::config(format!(
                "camera trauma_power must be positive, got {}",
                self.trauma_power
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Top-level simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second.
    pub tick_rate: f64,
    /// Upper bound on ticks run before a single render. Wall time beyond
    /// this is dropped rather than replayed.
    pub max_ticks_per_frame: u32,
    /// Multiplier on gameplay dt. Tweens ignore it.
    pub game_speed: f64,
    pub playfield: Playfield,
    /// How long `stop` waits for the simulation thread.
    pub stop_timeout_ms: u64,
    /// Seed for camera noise and spawners.
    pub seed: u64,
    pub camera: ShakeConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 50.0,
            max_ticks_per_frame: 8,
            game_speed: 1.0,
            playfield: Playfield::default(),
            stop_timeout_ms: 10_000,
            seed: 0x5eed,
            camera: ShakeConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let cfg: SimConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.tick_rate > 0.0 && self.tick_rate.is_finite()) {
            return Err(SimError::config(format!(
                "tick_rate must be positive and finite, got {}",
                self.tick_rate
            )));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(SimError::config("max_ticks_per_frame must be at least 1"));
        }
        if !(self.game_speed >= 0.0 && self.game_speed.is_finite()) {
            return Err(SimError::config(format!(
                "game_speed must be non-negative, got {}",
                self.game_speed
            )));
        }
        if !(self.playfield.width > 0.0 && self.playfield.height > 0.0) {
            return Err(SimError::config(format!(
                "playfield must have positive extent, got {}x{}",
                self.playfield.width, self.playfield.height
            )));
        }
        self.camera.validate()
    }

    /// Seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        1.0 / self.tick_rate
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}
