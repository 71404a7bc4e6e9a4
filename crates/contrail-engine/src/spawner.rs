//! Timer-driven power-up spawner.
//!
//! The spawner runs outside the tick loop on its own clock and feeds new
//! entities through an [`EntityProducer`], like any other producer.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::{debug, warn};

use crate::config::Playfield;
use crate::entities::{self, PowerUpKind};
use crate::error::SimError;
use crate::math::Vec2;
use crate::registry::EntityProducer;

/// Seconds between spawns.
pub const SPAWN_INTERVAL: f64 = 5.0;
/// Horizontal margin kept free at both playfield edges.
pub const SPAWN_MARGIN: i64 = 32;

#[derive(Debug)]
pub struct PowerUpSpawner {
    producer: EntityProducer,
    playfield: Playfield,
    rng: Pcg64,
    interval: f64,
    timer: f64,
}

impl PowerUpSpawner {
    /// The first power-up drops on the first update.
    pub fn new(producer: EntityProducer, playfield: Playfield, seed: u64) -> Result<Self, SimError> {
        Self::with_interval(producer, playfield, seed, SPAWN_INTERVAL)
    }

    pub fn with_interval(
        producer: EntityProducer,
        playfield: Playfield,
        seed: u64,
        interval: f64,
    ) -> Result<Self, SimError> {
        if !(interval > 0.0 && interval.is_finite()) {
            return Err(SimError::config(format!("spawn interval must be positive, got {interval}")));
        }
        if (playfield.width as i64) <= 2 * SPAWN_MARGIN {
            return Err(SimError::config(format!(
                "playfield width {} leaves no room to spawn",
                playfield.width
            )));
        }
        Ok(Self {
            producer,
            playfield,
            rng: Pcg64::seed_from_u64(seed),
            interval,
            timer: interval,
        })
    }

    /// Advance the timer. Returns the kind spawned, if any.
    pub fn update(&mut self, dt: f64) -> Option<PowerUpKind> {
        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer -= self.interval;

        let kind = PowerUpKind::ALL[self.rng.gen_range(0..PowerUpKind::ALL.len())];
        let x = self.rng.gen_range(SPAWN_MARGIN..self.playfield.width as i64 - SPAWN_MARGIN);
        let entity = match entities::power_up(kind, Vec2::new(x as f64, 0.0)) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(?kind, error = %e, "could not build power-up");
                return None;
            }
        };
        if !self.producer.send(entity) {
            debug!(?kind, "registry gone, power-up discarded");
            return None;
        }
        debug!(?kind, x, "power-up spawned");
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityRegistry;

    #[test]
    fn first_spawn_is_immediate_then_on_interval() {
        let registry = EntityRegistry::new();
        let mut spawner = PowerUpSpawner::new(registry.producer(), Playfield::default(), 1).unwrap();
        assert!(spawner.update(0.0).is_some());
        assert!(spawner.update(4.9).is_none());
        assert!(spawner.update(0.1).is_some());
    }

    #[test]
    fn same_seed_same_sequence() {
        let registry = EntityRegistry::new();
        let mut a = PowerUpSpawner::new(registry.producer(), Playfield::default(), 42).unwrap();
        let mut b = PowerUpSpawner::new(registry.producer(), Playfield::default(), 42).unwrap();
        let seq_a: Vec<_> = (0..10).map(|_| a.update(SPAWN_INTERVAL)).collect();
        let seq_b: Vec<_> = (0..10).map(|_| b.update(SPAWN_INTERVAL)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn narrow_playfield_is_rejected() {
        let registry = EntityRegistry::new();
        let narrow = Playfield { width: 60.0, height: 700.0 };
        assert!(PowerUpSpawner::new(registry.producer(), narrow, 0).is_err());
    }

    #[test]
    fn dropped_registry_stops_spawning() {
        let producer = EntityRegistry::new().producer();
        let mut spawner = PowerUpSpawner::new(producer, Playfield::default(), 3).unwrap();
        assert_eq!(spawner.update(0.0), None);
    }
}
