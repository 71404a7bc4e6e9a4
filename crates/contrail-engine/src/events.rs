//! Fire-and-forget notifications for audio and UI collaborators.
//!
//! The simulation never waits on a listener. Events go through a bounded
//! crossbeam channel with `try_send`; when the listener falls behind, new
//! events are dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;
use tracing::trace;

use crate::entity::EntityId;
use crate::stats::StatKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    /// Two jets crashed. `entity` was the faster one.
    Collision { entity: EntityId, other: EntityId, speed: f64 },
    /// Damage landed and the hit cue is not throttled.
    Hit { entity: EntityId, amount: f64, remaining: f64 },
    Healed { entity: EntityId, amount: f64 },
    /// A jet fired a volley.
    Shot { entity: EntityId },
    /// A stat effect started or was refreshed.
    EffectApplied { entity: EntityId, stat: Option<StatKey>, refreshed: bool },
    /// Health reached zero.
    Died { entity: EntityId },
    /// Removed from the live set.
    EntityDestroyed { entity: EntityId },
    PlayerDefeated { loser: EntityId },
}

/// Sending half handed to the simulation.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<Sender<SimEvent>>,
    dropped: Arc<AtomicU64>,
}

impl EventSink {
    /// A sink that discards everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Bounded sink and its receiver.
    pub fn bounded(capacity: usize) -> (Self, Receiver<SimEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (
            Self {
                tx: Some(tx),
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Never blocks.
    pub fn emit(&self, event: SimEvent) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(?event, "event sink full, dropping");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Events dropped because the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
