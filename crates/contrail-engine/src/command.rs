//! Deferred simulation commands and the per-tick context.
//!
//! Behaviours run while the registry is mutably borrowed, so anything that
//! reaches outside the entity in hand (spawning, shaking the camera, notifying
//! the event sink, touching a third entity) is pushed as a [`SimCommand`]
//! through the [`TickContext`]. The simulation drains these in FIFO order after
//! the update phase and again after the collision phase.

use contrail_ecs::command::{CausalReason, CommandBuffer};

use crate::combat::Effect;
use crate::config::Playfield;
use crate::entity::{Entity, EntityId};
use crate::events::SimEvent;
use crate::tween::Animate;

/// What a deferred command does.
#[derive(Debug)]
pub enum SimCommand {
    /// Hand a new entity to the registry. Live after the next flush.
    Spawn(Entity),
    /// Flag the target for removal.
    Destroy,
    /// Apply a power-up effect to the target.
    ApplyEffect(Effect),
    /// Add trauma to the camera.
    AddTrauma(f64),
    /// Forward to the event sink.
    Notify(SimEvent),
    /// The target player lost. Gameplay slows to a stop on real time.
    GameOver,
    /// Start a tween on real time.
    StartTween(Box<dyn Animate>),
}

pub type SimCommands = CommandBuffer<SimCommand>;

/// What a behaviour can see and do during one tick.
pub struct TickContext<'a> {
    commands: &'a mut SimCommands,
    pub playfield: Playfield,
    pub tick: u64,
}

impl<'a> TickContext<'a> {
    pub fn new(commands: &'a mut SimCommands, playfield: Playfield, tick: u64) -> Self {
        Self {
            commands,
            playfield,
            tick,
        }
    }

    pub fn spawn(&mut self, entity: Entity, reason: CausalReason) {
        self.commands.push(None, SimCommand::Spawn(entity), reason);
    }

    pub fn destroy(&mut self, target: EntityId, reason: CausalReason) {
        self.commands.push(Some(target), SimCommand::Destroy, reason);
    }

    pub fn apply_effect(&mut self, target: EntityId, effect: Effect, reason: CausalReason) {
        self.commands
            .push(Some(target), SimCommand::ApplyEffect(effect), reason);
    }

    pub fn add_trauma(&mut self, amount: f64, reason: CausalReason) {
        self.commands.push(None, SimCommand::AddTrauma(amount), reason);
    }

    pub fn notify(&mut self, event: SimEvent) {
        self.commands.push(
            None,
            SimCommand::Notify(event),
            CausalReason::SystemInternal("notify".to_owned()),
        );
    }

    pub fn game_over(&mut self, loser: EntityId, reason: CausalReason) {
        self.commands.push(Some(loser), SimCommand::GameOver, reason);
    }

    pub fn start_tween(&mut self, tween: Box<dyn Animate>, reason: CausalReason) {
        self.commands.push(None, SimCommand::StartTween(tween), reason);
    }

    /// Commands queued so far this tick.
    pub fn queued(&self) -> usize {
        self.commands.len()
    }
}
