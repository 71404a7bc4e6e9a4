//! Falling pickups.

use contrail_ecs::command::CausalReason;
use serde::{Deserialize, Serialize};

use crate::combat::{self, Effect};
use crate::command::TickContext;
use crate::entity::{Behavior, EntityCore};
use crate::error::SimError;
use crate::stats::StatKey;

/// Downward speed of a freshly spawned power-up.
pub const POWER_UP_FALL_SPEED: f64 = 100.0;

const EFFECT_DURATION: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    HealthKit,
    AttackBuff,
    AttackDebuff,
    SpeedBuff,
    SpeedDebuff,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::HealthKit,
        PowerUpKind::AttackBuff,
        PowerUpKind::AttackDebuff,
        PowerUpKind::SpeedBuff,
        PowerUpKind::SpeedDebuff,
    ];

    pub fn effect(self) -> Effect {
        match self {
            PowerUpKind::HealthKit => Effect::heal(50.0),
            PowerUpKind::AttackBuff => Effect::stat(StatKey::ProjectileDamage, 2.0, true, EFFECT_DURATION),
            PowerUpKind::AttackDebuff => Effect::stat(StatKey::ProjectileDamage, 0.5, true, EFFECT_DURATION),
            PowerUpKind::SpeedBuff => Effect::stat(StatKey::Speed, 2.0, true, EFFECT_DURATION),
            PowerUpKind::SpeedDebuff => Effect::stat(StatKey::Speed, 0.5, true, EFFECT_DURATION),
        }
    }

    /// Debuffs hit the collector's opponent instead of the collector.
    pub fn is_debuff(self) -> bool {
        matches!(self, PowerUpKind::AttackDebuff | PowerUpKind::SpeedDebuff)
    }

    pub fn visual(self) -> &'static str {
        match self {
            PowerUpKind::HealthKit => "health_kit",
            PowerUpKind::AttackBuff => "attack_buff",
            PowerUpKind::AttackDebuff => "attack_debuff",
            PowerUpKind::SpeedBuff => "speed_buff",
            PowerUpKind::SpeedDebuff => "speed_debuff",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PowerUp {
    kind: PowerUpKind,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> PowerUpKind {
        self.kind
    }
}

impl Behavior for PowerUp {
    fn name(&self) -> &'static str {
        "power_up"
    }

    fn update(&mut self, core: &mut EntityCore, dt: f64, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        core.integrate(dt, ctx);
        if core.body.position.y >= ctx.playfield.height {
            core.destroy();
        }
        Ok(())
    }

    fn on_collision(
        &mut self,
        core: &mut EntityCore,
        other: &mut EntityCore,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError> {
        if !other.kind.is_player() {
            return Ok(());
        }
        let effect = self.kind.effect();
        if self.kind.is_debuff() {
            // Nobody to debuff: leave the pickup where it is.
            let Some(opponent) = other.kind.opponent() else {
                return Ok(());
            };
            ctx.apply_effect(opponent, effect, CausalReason::CollisionResponse(core.id(), other.id()));
        } else {
            combat::apply_effect(other, effect, ctx);
        }
        core.destroy();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use contrail_ecs::command::CommandBuffer;

    use super::*;
    use crate::command::{SimCommand, SimCommands};
    use crate::config::Playfield;
    use crate::entities::{player, power_up};
    use crate::entity::{EntityId, EntityKind};
    use crate::math::Vec2;

    #[test]
    fn power_up_falls_out_of_the_playfield() {
        let mut p = power_up(PowerUpKind::HealthKit, Vec2::new(100.0, 650.0)).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
        p.update(0.4, &mut ctx).unwrap();
        assert!(!p.core.is_destroyed());
        p.update(0.2, &mut ctx).unwrap();
        assert!(p.core.is_destroyed());
    }

    #[test]
    fn buff_applies_to_collector() {
        let mut pickup = power_up(PowerUpKind::AttackBuff, Vec2::zeros()).unwrap();
        let mut jet = player(1, Vec2::zeros()).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
        pickup.react(&mut jet, &mut ctx).unwrap();
        assert!(pickup.core.is_destroyed());
        assert_eq!(jet.core.combat.as_ref().unwrap().stats.get(StatKey::ProjectileDamage), 10.0);
    }

    #[test]
    fn debuff_targets_opponent_or_stays() {
        let mut pickup = power_up(PowerUpKind::SpeedDebuff, Vec2::zeros()).unwrap();
        let mut loner = player(1, Vec2::zeros()).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        {
            let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
            pickup.react(&mut loner, &mut ctx).unwrap();
        }
        assert!(!pickup.core.is_destroyed());
        assert!(commands.is_empty());

        let rival = EntityId::new(9, 0);
        loner.core.kind = EntityKind::Player { slot: 1, opponent: Some(rival) };
        {
            let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
            pickup.react(&mut loner, &mut ctx).unwrap();
        }
        assert!(pickup.core.is_destroyed());
        let queued = commands.drain();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].target, Some(rival));
        assert!(matches!(queued[0].kind, SimCommand::ApplyEffect(_)));
        assert_eq!(loner.core.combat.as_ref().unwrap().stats.get(StatKey::Speed), 150.0);
    }
}
