//! Built-in entity roles of the dogfight: player jets, their projectiles,
//! falling power-ups and explosions.
//!
//! Each role is a [`Behavior`](crate::entity::Behavior) plus a builder here
//! that assembles the matching [`EntityCore`].

mod explosion;
mod jet;
mod powerup;
mod projectile;

use std::sync::Arc;

pub use explosion::{Explosion, EXPLOSION_LIFETIME};
pub use jet::{JetPilot, COLLISION_SPIN_DURATION, MUZZLE_SPREAD};
pub use powerup::{PowerUp, PowerUpKind, POWER_UP_FALL_SPEED};
pub use projectile::{Projectile, PROJECTILE_RANGE};

use crate::body::{layers, Body};
use crate::combat::Combat;
use crate::config::Playfield;
use crate::entity::{Entity, EntityCore, EntityId, EntityKind};
use crate::error::SimError;
use crate::kinematics::Kinematics;
use crate::math::Vec2;
use crate::registry::EntityRegistry;
use crate::shape::Shape;

/// Speed cap of a player jet.
pub const PLAYER_MAX_SPEED: f64 = 300.0;
/// Drawing and collision scale of a player jet.
pub const PLAYER_SCALE: f64 = 1.5;

/// Collision layer and mask of projectiles fired from player `slot`.
pub fn projectile_filter(slot: u8) -> (u32, u32) {
    match slot {
        1 => (layers::PROJECTILE_1, layers::PLAYER | layers::PROJECTILE_2),
        2 => (layers::PROJECTILE_2, layers::PLAYER | layers::PROJECTILE_1),
        _ => (0, layers::PLAYER),
    }
}

/// A player jet for `slot` (1 or 2), facing up.
pub fn player(slot: u8, position: Vec2) -> Result<Entity, SimError> {
    let visual = match slot {
        1 => "jet_1",
        2 => "jet_2",
        other => return Err(SimError::config(format!("player slot must be 1 or 2, got {other}"))),
    };
    let body = Body::new(
        position,
        Arc::new(Shape::ellipse(0.0, 0.0, 32.0, 30.0)?),
        layers::PLAYER,
        layers::PLAYER | layers::ENEMY,
    )
    .with_scale(Vec2::new(PLAYER_SCALE, PLAYER_SCALE));
    let core = EntityCore::new(EntityKind::Player { slot, opponent: None }, body)
        .with_kinematics(Kinematics::new(PLAYER_MAX_SPEED))
        .with_combat(Combat::default())
        .with_screen_wrap(true)
        .with_visual(visual);
    Ok(Entity::new(core, JetPilot))
}

/// A bullet centred on `position`. `damage` is fixed at fire time.
pub fn projectile(
    owner: EntityId,
    slot: u8,
    position: Vec2,
    velocity: Vec2,
    damage: f64,
) -> Result<Entity, SimError> {
    let (layer, mask) = projectile_filter(slot);
    let body = Body::new(position, Arc::new(Shape::rect_at(-2.0, -5.0, 4.0, 10.0)?), layer, mask)
        .with_rotation(crate::math::angle(velocity) + std::f64::consts::FRAC_PI_2);
    let core = EntityCore::new(EntityKind::Projectile { owner }, body)
        .with_kinematics(Kinematics::with_velocity(velocity.norm(), velocity));
    Ok(Entity::new(core, Projectile::new(position, damage)))
}

/// A falling power-up with its top-left corner at `position`.
pub fn power_up(kind: PowerUpKind, position: Vec2) -> Result<Entity, SimError> {
    let body = Body::new(position, Arc::new(Shape::rect(20.0, 20.0)?), layers::POWERUP, layers::PLAYER);
    let velocity = Vec2::new(0.0, POWER_UP_FALL_SPEED);
    let core = EntityCore::new(EntityKind::PowerUp, body)
        .with_kinematics(Kinematics::with_velocity(velocity.norm(), velocity))
        .with_visual(kind.visual());
    Ok(Entity::new(core, PowerUp::new(kind)))
}

/// A non-colliding explosion that removes itself after [`EXPLOSION_LIFETIME`].
pub fn explosion(position: Vec2, scale: f64) -> Result<Entity, SimError> {
    let body = Body::new(position, Arc::new(Shape::rect(32.0, 32.0)?), 0, 0).with_scale(Vec2::new(scale, scale));
    Ok(Entity::new(EntityCore::new(EntityKind::Explosion, body), Explosion::default()))
}

/// Queue both players of a versus round, linked as each other's opponent.
/// They go live at the registry's next update.
pub fn spawn_dogfight(registry: &mut EntityRegistry, playfield: &Playfield) -> Result<(EntityId, EntityId), SimError> {
    let y = playfield.height / 2.0;
    let mut first = player(1, Vec2::new(playfield.width * 0.19, y))?;
    let mut second = player(2, Vec2::new(playfield.width * 0.75, y))?;

    let first_id = registry.reserve_id();
    let second_id = registry.reserve_id();
    first.core.kind = EntityKind::Player { slot: 1, opponent: Some(second_id) };
    second.core.kind = EntityKind::Player { slot: 2, opponent: Some(first_id) };
    registry.add_reserved(first_id, first);
    registry.add_reserved(second_id, second);
    Ok((first_id, second_id))
}
