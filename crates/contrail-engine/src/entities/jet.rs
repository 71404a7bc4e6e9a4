//! Player-controlled jets.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use contrail_ecs::command::CausalReason;
use tracing::trace;

use crate::combat::Combat;
use crate::command::TickContext;
use crate::entity::{Behavior, EntityCore, EntityKind};
use crate::error::SimError;
use crate::events::SimEvent;
use crate::kinematics::Kinematics;
use crate::math::{self, Vec2};
use crate::stats::StatKey;

/// Distance of each gun from the jet's center line.
pub const MUZZLE_SPREAD: f64 = 15.0;
/// Seconds a rammed jet spins out of control.
pub const COLLISION_SPIN_DURATION: f64 = 1.5;

/// Crashes slower than this send the victim straight on without spinning.
const SPIN_MIN_IMPACT: f64 = 50.0;
/// Knockback below this speed just stops the jet.
const KNOCKBACK_MIN_SPEED: f64 = 10.0;

/// Flies a jet from its [`Controls`](crate::entity::Controls).
#[derive(Debug, Default, Clone, Copy)]
pub struct JetPilot;

fn parts(core: &mut EntityCore) -> Result<(&mut Kinematics, &mut Combat), SimError> {
    let id = core.id();
    match (core.kinematics.as_mut(), core.combat.as_mut()) {
        (Some(k), Some(c)) => Ok((k, c)),
        _ => Err(SimError::config(format!("jet {id} needs kinematics and combat"))),
    }
}

impl JetPilot {
    /// Turn and thrust from the controls, then bleed off drift toward the
    /// heading.
    fn steer(core: &mut EntityCore, dt: f64) -> Result<(), SimError> {
        let controls = core.controls;
        let dir = math::direction(core.body.rotation);
        let (k, combat) = parts(core)?;

        let mut thrust = 0.0;
        if combat.can_control() {
            thrust = controls.thrust_axis();
            k.angular_velocity = controls.turn_axis() * combat.stats.get(StatKey::RotationSpeed);
            k.acceleration = dir * combat.stats.get(StatKey::Speed) * thrust;
        }
        if combat.is_spinning() {
            return Ok(());
        }

        let v = k.velocity();
        if thrust == 0.0 {
            k.set_velocity(math::lerp(v, Vec2::zeros(), dt));
        } else {
            let heading = math::angle(dir * thrust);
            let sharp = angle_between(heading, math::angle(v)) > FRAC_PI_4;
            let target = math::from_polar(v.norm(), heading);
            k.set_velocity(math::lerp(v, target, if sharp { 0.05 } else { 0.01 }));
        }
        Ok(())
    }

    /// Fire two projectiles from the nose and recoil.
    fn shoot(core: &mut EntityCore, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        let id = core.id();
        let slot = match core.kind {
            EntityKind::Player { slot, .. } => slot,
            _ => 0,
        };
        let dir = math::direction(core.body.rotation);
        let nose = core.center() + dir * (core.body.size().y / 3.0);
        let side = math::rotated(dir, FRAC_PI_2) * MUZZLE_SPREAD;

        let (k, combat) = parts(core)?;
        let velocity = dir * combat.stats.get(StatKey::ProjectileSpeed) + k.velocity();
        let damage = combat.stats.get(StatKey::ProjectileDamage);
        for muzzle in [nose + side, nose - side] {
            let bullet = super::projectile(id, slot, muzzle, velocity, damage)?;
            ctx.spawn(bullet, CausalReason::PlayerInput("shoot".to_owned()));
        }
        k.set_velocity(k.velocity() - dir * combat.stats.get(StatKey::ShootKnockback));
        ctx.notify(SimEvent::Shot { entity: id });
        trace!(entity = %id, "volley");
        Ok(())
    }
}

impl Behavior for JetPilot {
    fn name(&self) -> &'static str {
        "jet_pilot"
    }

    fn update(&mut self, core: &mut EntityCore, dt: f64, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        Self::steer(core, dt)?;

        let shooting = core.controls.shooting;
        let volleys = {
            let (_, combat) = parts(core)?;
            combat.tick_effects(dt);
            combat.tick_shots(dt, shooting)
        };
        for _ in 0..volleys {
            Self::shoot(core, ctx)?;
        }
        parts(core)?.1.tick_status(dt);

        core.integrate(dt, ctx);
        Ok(())
    }

    /// Jet-to-jet crashes. The faster jet bounces back and shakes the camera,
    /// the slower one is shoved along the aggressor's path and may spin out.
    fn on_collision(
        &mut self,
        core: &mut EntityCore,
        other: &mut EntityCore,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError> {
        if !other.kind.is_player() {
            return Ok(());
        }
        let id = core.id();
        let own = core.last_velocity();
        let theirs = other.last_velocity();
        let dir = math::direction(core.body.rotation);
        let (k, combat) = parts(core)?;

        let (push, strength) = if own.norm() > theirs.norm() {
            let speed = own.norm();
            ctx.add_trauma(
                (speed / 350.0).min(0.9),
                CausalReason::CollisionResponse(id, other.id()),
            );
            ctx.notify(SimEvent::Collision {
                entity: id,
                other: other.id(),
                speed,
            });
            (own, -speed / 2.0)
        } else {
            let speed = theirs.norm();
            if speed > SPIN_MIN_IMPACT && dir.dot(&-math::normalize_or_zero(theirs)) <= 0.25 {
                let spin = k.angular_velocity;
                combat.start_spin(k, spin, COLLISION_SPIN_DURATION);
            }
            (theirs, speed / 1.5)
        };

        if push.norm() > KNOCKBACK_MIN_SPEED {
            k.acceleration = Vec2::zeros();
            k.set_velocity(math::normalize_or_zero(push) * strength);
        } else {
            k.set_velocity(Vec2::zeros());
        }
        Ok(())
    }
}

/// Smallest absolute difference between two angles.
fn angle_between(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(std::f64::consts::TAU);
    d.min(std::f64::consts::TAU - d)
}

#[cfg(test)]
mod tests {
    use contrail_ecs::command::CommandBuffer;

    use super::*;
    use crate::command::{SimCommand, SimCommands};
    use crate::config::Playfield;
    use crate::entities::player;
    use crate::entity::{Controls, Entity};

    fn jet_at(x: f64, y: f64) -> Entity {
        player(1, Vec2::new(x, y)).unwrap()
    }

    fn step(entity: &mut Entity, dt: f64, commands: &mut SimCommands) {
        let mut ctx = TickContext::new(commands, Playfield::default(), 0);
        entity.update(dt, &mut ctx).unwrap();
    }

    #[test]
    fn thrust_accelerates_along_heading() {
        let mut jet = jet_at(500.0, 350.0);
        jet.core.controls = Controls { forward: true, ..Default::default() };
        let mut commands = CommandBuffer::new();
        step(&mut jet, 0.1, &mut commands);
        let v = jet.core.kinematics.as_ref().unwrap().velocity();
        assert!(v.y < 0.0, "jet should move up, got {v:?}");
        assert!(v.x.abs() < 1e-9);
    }

    #[test]
    fn idle_jet_drifts_to_a_stop() {
        let mut jet = jet_at(500.0, 350.0);
        jet.core.kinematics.as_mut().unwrap().set_velocity(Vec2::new(100.0, 0.0));
        let mut commands = CommandBuffer::new();
        for _ in 0..200 {
            step(&mut jet, 0.02, &mut commands);
        }
        assert!(jet.core.kinematics.as_ref().unwrap().velocity().norm() < 5.0);
    }

    #[test]
    fn holding_fire_spawns_pairs_and_recoils() {
        let mut jet = jet_at(500.0, 350.0);
        jet.core.controls = Controls { shooting: true, ..Default::default() };
        let mut commands = CommandBuffer::new();
        // The shot timer starts empty, so the first volley needs one delay.
        for _ in 0..13 {
            step(&mut jet, 0.02, &mut commands);
        }
        let spawned = commands
            .commands()
            .iter()
            .filter(|c| matches!(c.kind, SimCommand::Spawn(_)))
            .count();
        assert_eq!(spawned, 2);
        assert!(jet.core.kinematics.as_ref().unwrap().velocity().y > 0.0);
    }

    #[test]
    fn spinning_jet_ignores_controls() {
        let mut jet = jet_at(500.0, 350.0);
        {
            let k = jet.core.kinematics.as_mut().unwrap();
            let c = jet.core.combat.as_mut().unwrap();
            c.start_spin(k, 1.0, 1.0);
        }
        jet.core.controls = Controls { turn_left: true, ..Default::default() };
        let mut commands = CommandBuffer::new();
        step(&mut jet, 0.02, &mut commands);
        assert_eq!(jet.core.kinematics.as_ref().unwrap().angular_velocity, 6.0);
    }

    #[test]
    fn ramming_bounces_aggressor_and_spins_victim() {
        let mut attacker = jet_at(0.0, 0.0);
        let mut victim = jet_at(40.0, 0.0);
        // Attacker flies right into the victim's side.
        attacker.core.body.rotation = FRAC_PI_2;
        let mut commands = CommandBuffer::new();
        {
            let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
            attacker.core.kinematics.as_mut().unwrap().set_velocity(Vec2::new(200.0, 0.0));
            attacker.core.integrate(0.0, &ctx);
            victim.core.integrate(0.0, &ctx);
            attacker.react(&mut victim, &mut ctx).unwrap();
            victim.react(&mut attacker, &mut ctx).unwrap();
        }

        let av = attacker.core.kinematics.as_ref().unwrap().velocity();
        assert!((av - Vec2::new(-100.0, 0.0)).norm() < 1e-9);
        let vv = victim.core.kinematics.as_ref().unwrap().velocity();
        assert!((vv - Vec2::new(200.0 / 1.5, 0.0)).norm() < 1e-9);
        assert!(victim.core.combat.as_ref().unwrap().is_spinning());
        assert!(commands
            .commands()
            .iter()
            .any(|c| matches!(c.kind, SimCommand::AddTrauma(t) if (t - 200.0 / 350.0).abs() < 1e-12)));
    }

    #[test]
    fn angle_between_wraps() {
        assert!((angle_between(3.0, -3.0) - (std::f64::consts::TAU - 6.0)).abs() < 1e-12);
        assert_eq!(angle_between(1.0, 1.0), 0.0);
    }
}
