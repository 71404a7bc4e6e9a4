//! Contrail Engine -- fixed-tick 2D simulation kernel for a two-jet dogfight.
//!
//! This crate builds on [`contrail_ecs`] to provide the simulation proper:
//! kinematic bodies with layer/mask collision filtering, an entity registry
//! with deferred add/remove, edge-triggered collision detection, tweens on
//! real time, a trauma-driven shaking camera and a fixed-step clock that runs
//! the whole thing on its own thread.
//!
//! # Quick Start
//!
//! ```
//! use contrail_engine::prelude::*;
//!
//! let config = SimConfig::default();
//! let playfield = config.playfield;
//! let mut sim = Simulation::new(config).unwrap();
//! let (p1, _p2) = entities::spawn_dogfight(sim.registry_mut(), &playfield).unwrap();
//!
//! sim.control_sender().send(p1, Controls { forward: true, ..Default::default() });
//! for _ in 0..50 {
//!     sim.step(1.0 / 50.0);
//! }
//! assert_eq!(sim.tick(), 50);
//! assert_eq!(sim.registry().len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod camera;
pub mod clock;
pub mod collision;
pub mod combat;
pub mod command;
pub mod config;
pub mod entities;
pub mod entity;
pub mod error;
pub mod events;
pub mod kinematics;
pub mod logging;
pub mod math;
pub mod registry;
pub mod shape;
pub mod simulation;
pub mod spawner;
pub mod stats;
pub mod tween;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use contrail_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use contrail_ecs::prelude::*;

    pub use crate::body::{layers, Body};
    pub use crate::camera::ShakeCamera;
    pub use crate::clock::{FixedStep, NullRenderer, Renderer, RunningSimulation, SimulationRunner};
    pub use crate::collision::{CollisionDetector, CollisionReport};
    pub use crate::combat::{Combat, DamageOutcome, Effect, EffectKind};
    pub use crate::command::{SimCommand, SimCommands, TickContext};
    pub use crate::config::{Playfield, ShakeConfig, SimConfig};
    pub use crate::entities::{self, PowerUpKind};
    pub use crate::entity::{Behavior, Controls, Entity, EntityCore, EntityId, EntityKind, EntityView};
    pub use crate::error::SimError;
    pub use crate::events::{EventSink, SimEvent};
    pub use crate::kinematics::Kinematics;
    pub use crate::logging::init_tracing;
    pub use crate::math::{Point, Transform2D, Vec2};
    pub use crate::registry::{EntityProducer, EntityRegistry, RegistryReport};
    pub use crate::shape::{Bounds, Shape, TransformedShape};
    pub use crate::simulation::{ControlSender, FrameSnapshot, GameSpeed, Simulation, TickReport};
    pub use crate::spawner::PowerUpSpawner;
    pub use crate::stats::{Modifier, ModifierKind, Stat, StatBlock, StatKey};
    pub use crate::tween::{Animate, Easing, Lerp, Tween, TweenHandler, TweenId};
}
