//! One fixed tick of the whole kernel.
//!
//! [`Simulation::step`] runs, in order:
//!
//! 1. control intents received since the last tick
//! 2. entity updates on gameplay dt (real dt times game speed)
//! 3. deferred commands
//! 4. collision detection and reactions
//! 5. deferred commands again
//! 6. tweens on real dt
//! 7. camera shake on gameplay dt
//!
//! Game speed and tween time never mix: a game speed of zero freezes entities
//! and the camera while tweens keep running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, trace, warn};

use crate::camera::ShakeCamera;
use crate::collision::{CollisionDetector, CollisionReport};
use crate::combat;
use crate::command::{SimCommand, SimCommands, TickContext};
use crate::config::SimConfig;
use crate::entity::{Controls, Entity, EntityId, EntityView};
use crate::error::SimError;
use crate::events::{EventSink, SimEvent};
use crate::math::Transform2D;
use crate::registry::{EntityRegistry, RegistryReport};
use crate::tween::{Easing, Tween, TweenHandler};

/// Real seconds over which gameplay slows to a halt after a player dies.
pub const GAME_OVER_SLOWDOWN: f64 = 2.0;

/// Command drains per phase. Commands queued by the last round wait for the
/// next phase.
const MAX_COMMAND_ROUNDS: usize = 4;

// ---------------------------------------------------------------------------
// GameSpeed
// ---------------------------------------------------------------------------

/// Shared gameplay time multiplier. Clones observe the same value.
#[derive(Debug, Clone)]
pub struct GameSpeed(Arc<AtomicU64>);

impl GameSpeed {
    pub fn new(speed: f64) -> Self {
        Self(Arc::new(AtomicU64::new(speed.max(0.0).to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Negative speeds are stored as zero.
    pub fn set(&self, speed: f64) {
        self.0.store(speed.max(0.0).to_bits(), Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// ControlSender
// ---------------------------------------------------------------------------

/// Input-side handle. Intents take effect at the start of the next tick.
///
/// Intents for an entity that is still pending are held until it goes live.
/// Intents for unknown or removed entities are dropped.
#[derive(Debug, Clone)]
pub struct ControlSender {
    tx: Sender<(EntityId, Controls)>,
}

impl ControlSender {
    /// Returns `false` once the simulation is gone.
    pub fn send(&self, entity: EntityId, controls: Controls) -> bool {
        self.tx.send((entity, controls)).is_ok()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Read-only picture of one frame for a renderer.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub entities: Vec<EntityView>,
    pub camera_transform: Transform2D,
    pub camera_inverse: Transform2D,
    pub tick: u64,
    pub game_time: f64,
    pub real_time: f64,
    pub game_speed: f64,
}

/// What one [`Simulation::step`] did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub registry: RegistryReport,
    pub collisions: CollisionReport,
    pub commands_applied: usize,
    /// Gameplay dt used for this tick.
    pub dt: f64,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    registry: EntityRegistry,
    collisions: CollisionDetector,
    tweens: TweenHandler,
    camera: ShakeCamera,
    commands: SimCommands,
    events: EventSink,
    speed: GameSpeed,
    controls_tx: Sender<(EntityId, Controls)>,
    controls_rx: Receiver<(EntityId, Controls)>,
    held_controls: Vec<(EntityId, Controls)>,
    tick: u64,
    game_time: f64,
    real_time: f64,
    loser: Option<EntityId>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let camera = ShakeCamera::new(config.camera.clone(), config.playfield, config.seed)?;
        let (controls_tx, controls_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            speed: GameSpeed::new(config.game_speed),
            config,
            registry: EntityRegistry::new(),
            collisions: CollisionDetector::new(),
            tweens: TweenHandler::new(),
            camera,
            commands: SimCommands::new(),
            events: EventSink::disabled(),
            controls_tx,
            controls_rx,
            held_controls: Vec::new(),
            tick: 0,
            game_time: 0.0,
            real_time: 0.0,
            loser: None,
        })
    }

    pub fn with_event_sink(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Advance one tick. `real_dt` is the fixed tick length in wall seconds.
    pub fn step(&mut self, real_dt: f64) -> TickReport {
        let dt = real_dt * self.speed.get();
        self.apply_controls();

        let registry = {
            let mut ctx = TickContext::new(&mut self.commands, self.config.playfield, self.tick);
            self.registry.update(dt, &mut ctx)
        };
        for &id in &registry.flush.removed {
            self.collisions.forget(id);
            self.events.emit(SimEvent::EntityDestroyed { entity: id });
        }
        let mut commands_applied = self.apply_commands();

        let collisions = {
            let mut ctx = TickContext::new(&mut self.commands, self.config.playfield, self.tick);
            self.collisions.update(&mut self.registry, &mut ctx)
        };
        commands_applied += self.apply_commands();

        self.tweens.update(real_dt);
        self.camera.update(dt);

        self.tick += 1;
        self.game_time += dt;
        self.real_time += real_dt;
        TickReport {
            registry,
            collisions,
            commands_applied,
            dt,
        }
    }

    /// Held intents go first so newer ones from the channel win.
    fn apply_controls(&mut self) {
        let held = std::mem::take(&mut self.held_controls);
        let incoming: Vec<_> = self.controls_rx.try_iter().collect();
        for (id, controls) in held.into_iter().chain(incoming) {
            if let Some(entity) = self.registry.get_mut(id) {
                entity.core.controls = controls;
            } else if self.registry.is_pending_add(id) {
                trace!(entity = %id, "holding controls for pending entity");
                self.held_controls.push((id, controls));
            } else {
                debug!(entity = %id, "controls for unknown entity");
            }
        }
    }

    /// Drain deferred commands in FIFO order. Returns how many ran.
    fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        for _ in 0..MAX_COMMAND_ROUNDS {
            let batch = self.commands.drain();
            if batch.is_empty() {
                return applied;
            }
            for command in batch {
                applied += 1;
                self.apply(command.target, command.kind);
            }
        }
        if !self.commands.is_empty() {
            warn!(
                left = self.commands.len(),
                tick = self.tick,
                "command cascade deferred to the next phase"
            );
        }
        applied
    }

    fn apply(&mut self, target: Option<EntityId>, kind: SimCommand) {
        match kind {
            SimCommand::Spawn(entity) => {
                let id = self.registry.add(entity);
                debug!(entity = %id, "spawned");
            }
            SimCommand::Destroy => {
                if let Some(e) = target.and_then(|id| self.registry.get_mut(id)) {
                    e.core.destroy();
                }
            }
            SimCommand::ApplyEffect(effect) => {
                let Some(e) = target.and_then(|id| self.registry.get_mut(id)) else {
                    debug!(?target, "effect target is gone");
                    return;
                };
                if e.core.is_destroyed() {
                    return;
                }
                let mut ctx = TickContext::new(&mut self.commands, self.config.playfield, self.tick);
                combat::apply_effect(&mut e.core, effect, &mut ctx);
            }
            SimCommand::AddTrauma(amount) => self.camera.add_trauma(amount),
            SimCommand::Notify(event) => self.events.emit(event),
            SimCommand::GameOver => {
                if let Some(loser) = target {
                    self.game_over(loser);
                }
            }
            SimCommand::StartTween(tween) => {
                self.tweens.add(tween);
            }
        }
    }

    /// First defeat wins; later ones are ignored.
    fn game_over(&mut self, loser: EntityId) {
        if self.loser.is_some() {
            return;
        }
        self.loser = Some(loser);
        info!(%loser, tick = self.tick, "player defeated");
        self.events.emit(SimEvent::PlayerDefeated { loser });

        let speed = self.speed.clone();
        match Tween::new(GAME_OVER_SLOWDOWN, self.speed.get(), 0.0, Easing::Linear) {
            Ok(tween) => {
                self.tweens.add(Box::new(tween.with_consumer(move |v| speed.set(v))));
            }
            Err(e) => warn!(error = %e, "could not start game over slowdown"),
        }
    }

    // -- accessors -----------------------------------------------------------

    /// Queue an entity. Live after the next step.
    pub fn add(&mut self, entity: Entity) -> EntityId {
        self.registry.add(entity)
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn collisions(&self) -> &CollisionDetector {
        &self.collisions
    }

    pub fn tweens_mut(&mut self) -> &mut TweenHandler {
        &mut self.tweens
    }

    pub fn camera(&self) -> &ShakeCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ShakeCamera {
        &mut self.camera
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Shared handle to the game speed multiplier.
    pub fn game_speed(&self) -> GameSpeed {
        self.speed.clone()
    }

    pub fn control_sender(&self) -> ControlSender {
        ControlSender {
            tx: self.controls_tx.clone(),
        }
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Accumulated gameplay seconds.
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Accumulated wall seconds.
    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    /// The defeated player once the round is over.
    pub fn loser(&self) -> Option<EntityId> {
        self.loser
    }

    pub fn frame(&self) -> FrameSnapshot {
        FrameSnapshot {
            entities: self.registry.snapshot(),
            camera_transform: self.camera.transform(),
            camera_inverse: self.camera.inverse_transform(),
            tick: self.tick,
            game_time: self.game_time,
            real_time: self.real_time,
            game_speed: self.speed.get(),
        }
    }
}
