//! Bullets fired by jets.

use crate::combat;
use crate::command::TickContext;
use crate::entity::{Behavior, EntityCore, EntityId, EntityKind};
use crate::error::SimError;
use crate::math::Vec2;

/// Distance a projectile travels before it is removed.
pub const PROJECTILE_RANGE: f64 = 1200.0;

#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    origin: Vec2,
    damage: f64,
}

impl Projectile {
    pub fn new(origin: Vec2, damage: f64) -> Self {
        Self { origin, damage }
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }
}

fn owner_of(kind: &EntityKind) -> Option<EntityId> {
    match kind {
        EntityKind::Projectile { owner } => Some(*owner),
        _ => None,
    }
}

impl Behavior for Projectile {
    fn name(&self) -> &'static str {
        "projectile"
    }

    fn update(&mut self, core: &mut EntityCore, dt: f64, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        core.integrate(dt, ctx);
        if (core.body.position - self.origin).norm() > PROJECTILE_RANGE {
            core.destroy();
        }
        Ok(())
    }

    /// Damages any player but its owner and cancels against projectiles of
    /// another owner. Either way the projectile is spent.
    fn on_collision(
        &mut self,
        core: &mut EntityCore,
        other: &mut EntityCore,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError> {
        let owner = owner_of(&core.kind);
        match other.kind {
            EntityKind::Player { .. } => {
                if owner == Some(other.id()) {
                    return Ok(());
                }
                combat::damage(other, self.damage, false, ctx);
                core.destroy();
            }
            // Both go at once: destroying one clears its filter, so the
            // partner never gets its own reaction.
            EntityKind::Projectile { owner: theirs } => {
                if owner == Some(theirs) {
                    return Ok(());
                }
                core.destroy();
                other.destroy();
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use contrail_ecs::command::CommandBuffer;

    use super::*;
    use crate::command::{SimCommand, SimCommands};
    use crate::config::Playfield;
    use crate::entities::{player, projectile};
    use crate::entity::Entity;

    fn shooter() -> (EntityId, Entity) {
        let id = EntityId::new(1, 0);
        let mut jet = player(1, Vec2::new(100.0, 100.0)).unwrap();
        jet.core.assign_id(id);
        (id, jet)
    }

    #[test]
    fn out_of_range_projectile_is_destroyed() {
        let (owner, _) = shooter();
        let mut bullet = projectile(owner, 1, Vec2::zeros(), Vec2::new(300.0, 0.0), 5.0).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
        bullet.update(3.9, &mut ctx).unwrap();
        assert!(!bullet.core.is_destroyed());
        bullet.update(0.2, &mut ctx).unwrap();
        assert!(bullet.core.is_destroyed());
    }

    #[test]
    fn projectile_spares_its_owner_and_hits_others() {
        let (owner, mut own_jet) = shooter();
        let mut enemy = player(2, Vec2::new(300.0, 100.0)).unwrap();
        enemy.core.assign_id(EntityId::new(2, 0));
        let mut bullet = projectile(owner, 1, Vec2::zeros(), Vec2::new(300.0, 0.0), 7.0).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);

        bullet.react(&mut own_jet, &mut ctx).unwrap();
        assert!(!bullet.core.is_destroyed());
        assert_eq!(own_jet.core.combat.as_ref().unwrap().health(), 100.0);

        bullet.react(&mut enemy, &mut ctx).unwrap();
        assert!(bullet.core.is_destroyed());
        assert_eq!(enemy.core.combat.as_ref().unwrap().health(), 93.0);
        assert!(commands.commands().iter().any(|c| matches!(c.kind, SimCommand::AddTrauma(_))));
    }

    #[test]
    fn opposing_projectiles_cancel() {
        let a_owner = EntityId::new(1, 0);
        let b_owner = EntityId::new(2, 0);
        let mut a = projectile(a_owner, 1, Vec2::zeros(), Vec2::new(300.0, 0.0), 5.0).unwrap();
        let mut b = projectile(b_owner, 2, Vec2::zeros(), Vec2::new(-300.0, 0.0), 5.0).unwrap();
        let mut twin = projectile(a_owner, 1, Vec2::zeros(), Vec2::new(300.0, 0.0), 5.0).unwrap();
        let mut commands: SimCommands = CommandBuffer::new();
        let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);

        a.react(&mut twin, &mut ctx).unwrap();
        assert!(!a.core.is_destroyed());
        a.react(&mut b, &mut ctx).unwrap();
        assert!(a.core.is_destroyed());
        assert!(b.core.is_destroyed());
        assert!(!twin.core.is_destroyed());
    }
}
