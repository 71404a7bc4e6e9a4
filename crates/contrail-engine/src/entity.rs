//! Entities as a fixed set of capabilities plus a behaviour.
//!
//! An [`Entity`] is an [`EntityCore`] (identity, [`Body`], optional
//! [`Kinematics`], optional [`Combat`], control intents) paired with a boxed
//! [`Behavior`] that decides what happens each tick and on contact. The
//! [`EntityKind`] tag lets behaviours recognise what they touched without
//! downcasting.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::combat::Combat;
use crate::command::TickContext;
use crate::error::SimError;
use crate::kinematics::{self, Kinematics};
use crate::math::{Transform2D, Vec2};
use crate::shape::Shape;

/// Stable identity of an entity inside the registry.
pub type EntityId = contrail_ecs::handle::Handle;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// What an entity is, as seen by others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A player-controlled jet. `slot` is 1 or 2.
    Player { slot: u8, opponent: Option<EntityId> },
    /// A bullet fired by `owner`.
    Projectile { owner: EntityId },
    /// A falling pickup.
    PowerUp,
    /// Cosmetic, never collides.
    Explosion,
    /// Anything else.
    Prop,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Player { .. } => "player",
            EntityKind::Projectile { .. } => "projectile",
            EntityKind::PowerUp => "power_up",
            EntityKind::Explosion => "explosion",
            EntityKind::Prop => "prop",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, EntityKind::Player { .. })
    }

    /// Opponent of a player, if linked.
    pub fn opponent(&self) -> Option<EntityId> {
        match self {
            EntityKind::Player { opponent, .. } => *opponent,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Control intents written by an input source between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub turn_left: bool,
    pub turn_right: bool,
    pub forward: bool,
    pub backward: bool,
    pub shooting: bool,
}

impl Controls {
    /// -1, 0 or 1.
    pub fn turn_axis(&self) -> f64 {
        (self.turn_right as i8 - self.turn_left as i8) as f64
    }

    /// -1, 0 or 1.
    pub fn thrust_axis(&self) -> f64 {
        (self.forward as i8 - self.backward as i8) as f64
    }
}

// ---------------------------------------------------------------------------
// EntityCore
// ---------------------------------------------------------------------------

/// The data part of an entity.
#[derive(Debug, Clone)]
pub struct EntityCore {
    id: EntityId,
    pub kind: EntityKind,
    pub body: Body,
    pub kinematics: Option<Kinematics>,
    pub combat: Option<Combat>,
    pub controls: Controls,
    /// Wrap to the opposite edge after leaving the playfield.
    pub screen_wrap: bool,
    /// Opaque tag the renderer maps to a sprite.
    pub visual: &'static str,
}

impl EntityCore {
    pub fn new(kind: EntityKind, body: Body) -> Self {
        Self {
            id: EntityId::DANGLING,
            kind,
            body,
            kinematics: None,
            combat: None,
            controls: Controls::default(),
            screen_wrap: false,
            visual: kind.name(),
        }
    }

    pub fn with_kinematics(mut self, kinematics: Kinematics) -> Self {
        self.kinematics = Some(kinematics);
        self
    }

    pub fn with_combat(mut self, combat: Combat) -> Self {
        self.combat = Some(combat);
        self
    }

    pub fn with_screen_wrap(mut self, wrap: bool) -> Self {
        self.screen_wrap = wrap;
        self
    }

    pub fn with_visual(mut self, visual: &'static str) -> Self {
        self.visual = visual;
        self
    }

    /// [`EntityId::DANGLING`] until the registry adopts the entity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: EntityId) {
        self.id = id;
    }

    /// Flag for removal. Layer and mask drop to zero at once.
    pub fn destroy(&mut self) {
        self.body.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.is_destroyed()
    }

    /// Velocity of the last integration step, zero for static entities.
    pub fn last_velocity(&self) -> Vec2 {
        self.kinematics
            .as_ref()
            .map(Kinematics::last_velocity)
            .unwrap_or_else(Vec2::zeros)
    }

    /// Run the kinematic step and, if enabled, the screen wrap.
    pub fn integrate(&mut self, dt: f64, ctx: &TickContext<'_>) {
        if let Some(k) = self.kinematics.as_mut() {
            k.integrate(&mut self.body, dt);
        }
        if self.screen_wrap {
            kinematics::wrap_into(&mut self.body, &ctx.playfield);
        }
    }

    /// Scaled center of the outline in world space, before rotation.
    pub fn center(&self) -> Vec2 {
        self.body.pivot().coords
    }

    pub fn view(&self) -> EntityView {
        EntityView {
            id: self.id,
            kind: self.kind,
            visual: self.visual,
            position: self.body.position,
            rotation: self.body.rotation,
            scale: self.body.scale,
            shape: Arc::clone(self.body.shape()),
            transform: self.body.transform(),
            layer: self.body.layer(),
            mask: self.body.mask(),
            destroyed: self.body.is_destroyed(),
            velocity: self.kinematics.as_ref().map(Kinematics::velocity),
            health: self.combat.as_ref().map(|c| (c.health(), c.max_health())),
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// Per-entity logic. Errors are logged by the caller and only skip this
/// entity for the current operation.
pub trait Behavior: Send {
    fn name(&self) -> &'static str;

    fn update(
        &mut self,
        core: &mut EntityCore,
        dt: f64,
        ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError>;

    /// Called once when `other` starts overlapping `core` and `core`'s mask
    /// selects `other`'s layer.
    fn on_collision(
        &mut self,
        _core: &mut EntityCore,
        _other: &mut EntityCore,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

pub struct Entity {
    pub core: EntityCore,
    pub(crate) behavior: Box<dyn Behavior>,
}

impl Entity {
    pub fn new(core: EntityCore, behavior: impl Behavior + 'static) -> Self {
        Self {
            core,
            behavior: Box::new(behavior),
        }
    }

    pub fn id(&self) -> EntityId {
        self.core.id()
    }

    pub fn behavior_name(&self) -> &'static str {
        self.behavior.name()
    }

    pub(crate) fn update(&mut self, dt: f64, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        self.behavior.update(&mut self.core, dt, ctx)
    }

    pub(crate) fn react(&mut self, other: &mut Entity, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        self.behavior.on_collision(&mut self.core, &mut other.core, ctx)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("behavior", &self.behavior.name())
            .field("core", &self.core)
            .finish()
    }
}

/// Moves with its kinematics and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inert;

impl Behavior for Inert {
    fn name(&self) -> &'static str {
        "inert"
    }

    fn update(&mut self, core: &mut EntityCore, dt: f64, ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        core.integrate(dt, ctx);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EntityView
// ---------------------------------------------------------------------------

/// Read-only copy of an entity handed to renderers and observers.
#[derive(Debug, Clone)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub visual: &'static str,
    pub position: Vec2,
    pub rotation: f64,
    pub scale: Vec2,
    pub shape: Arc<Shape>,
    pub transform: Transform2D,
    pub layer: u32,
    pub mask: u32,
    pub destroyed: bool,
    pub velocity: Option<Vec2>,
    /// `(current, max)` for combat-capable entities.
    pub health: Option<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::layers;

    #[test]
    fn controls_axes() {
        let c = Controls { turn_left: true, forward: true, backward: true, ..Default::default() };
        assert_eq!(c.turn_axis(), -1.0);
        assert_eq!(c.thrust_axis(), 0.0);
    }

    #[test]
    fn fresh_core_is_unassigned_and_destroy_clears_filter() {
        let body = Body::new(
            Vec2::zeros(),
            Arc::new(Shape::rect(4.0, 4.0).unwrap()),
            layers::PLAYER,
            layers::PLAYER,
        );
        let mut core = EntityCore::new(EntityKind::Prop, body);
        assert_eq!(core.id(), EntityId::DANGLING);
        core.destroy();
        let view = core.view();
        assert!(view.destroyed);
        assert_eq!((view.layer, view.mask), (0, 0));
    }

    #[test]
    fn opponent_only_for_players() {
        let other = EntityId::new(3, 0);
        assert_eq!(EntityKind::Player { slot: 1, opponent: Some(other) }.opponent(), Some(other));
        assert_eq!(EntityKind::PowerUp.opponent(), None);
    }
}
