//! Edge-triggered collision detection across whole ticks.
//!
//! Validates:
//! 1. Overlapping squares on a shared layer react exactly once each
//! 2. A corner contact is not an overlap
//! 3. A sustained overlap never re-fires; separating and re-entering does
//! 4. A reaction that fails does not stop the pass

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contrail_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Counts collision callbacks and otherwise sits still.
struct Counter {
    hits: Arc<AtomicUsize>,
    fail: bool,
}

impl Behavior for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn update(&mut self, _core: &mut EntityCore, _dt: f64, _ctx: &mut TickContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    fn on_collision(
        &mut self,
        _core: &mut EntityCore,
        _other: &mut EntityCore,
        _ctx: &mut TickContext<'_>,
    ) -> Result<(), SimError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SimError::Configuration("reaction failed".into()));
        }
        Ok(())
    }
}

fn square(x: f64, y: f64, fail: bool) -> (Entity, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let body = Body::new(Vec2::new(x, y), Arc::new(Shape::rect(10.0, 10.0).unwrap()), 1, 1);
    let entity = Entity::new(
        EntityCore::new(EntityKind::Prop, body),
        Counter {
            hits: Arc::clone(&hits),
            fail,
        },
    );
    (entity, hits)
}

struct World {
    registry: EntityRegistry,
    detector: CollisionDetector,
    commands: SimCommands,
}

impl World {
    fn new() -> Self {
        Self {
            registry: EntityRegistry::new(),
            detector: CollisionDetector::new(),
            commands: CommandBuffer::new(),
        }
    }

    fn tick(&mut self) -> CollisionReport {
        let mut ctx = TickContext::new(&mut self.commands, Playfield::default(), 0);
        self.registry.update(0.02, &mut ctx);
        self.detector.update(&mut self.registry, &mut ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn overlapping_squares_react_once_each() {
    let mut world = World::new();
    let (a, hits_a) = square(0.0, 0.0, false);
    let (b, hits_b) = square(5.0, 5.0, false);
    let (c, hits_c) = square(15.0, 15.0, false);
    world.registry.add(a);
    world.registry.add(b);
    world.registry.add(c);

    let report = world.tick();
    assert_eq!(report.reactions.len(), 2);
    assert_eq!(hits_a.load(Ordering::SeqCst), 1);
    assert_eq!(hits_b.load(Ordering::SeqCst), 1);
    assert_eq!(hits_c.load(Ordering::SeqCst), 0, "corner contact is not an overlap");
}

#[test]
fn sustained_overlap_fires_only_on_entry() {
    let mut world = World::new();
    let (a, hits_a) = square(0.0, 0.0, false);
    let (b, hits_b) = square(5.0, 5.0, false);
    let a = world.registry.add(a);
    let b = world.registry.add(b);

    for _ in 0..10 {
        world.tick();
    }
    assert_eq!(hits_a.load(Ordering::SeqCst), 1);
    assert_eq!(hits_b.load(Ordering::SeqCst), 1);
    assert!(world.detector.is_touching(a, b));

    // Separate, then overlap again.
    world.registry.get_mut(b).unwrap().core.body.position = Vec2::new(100.0, 100.0);
    let report = world.tick();
    assert!(report.reactions.is_empty());
    assert!(!world.detector.is_touching(a, b));

    world.registry.get_mut(b).unwrap().core.body.position = Vec2::new(5.0, 5.0);
    let report = world.tick();
    assert_eq!(report.reactions.len(), 2);
    assert_eq!(hits_a.load(Ordering::SeqCst), 2);
    assert_eq!(hits_b.load(Ordering::SeqCst), 2);
}

#[test]
fn failing_reaction_is_contained() {
    let mut world = World::new();
    let (a, hits_a) = square(0.0, 0.0, true);
    let (b, hits_b) = square(5.0, 5.0, false);
    world.registry.add(a);
    world.registry.add(b);

    let report = world.tick();
    assert_eq!(report.faults, 1);
    assert_eq!(hits_a.load(Ordering::SeqCst), 1);
    assert_eq!(hits_b.load(Ordering::SeqCst), 1);
}

#[test]
fn filter_change_stops_reactions() {
    let mut world = World::new();
    let (a, hits_a) = square(0.0, 0.0, false);
    let (b, _) = square(5.0, 5.0, false);
    let a = world.registry.add(a);
    let b = world.registry.add(b);
    world.tick();
    assert!(world.detector.is_touching(a, b));

    world.registry.get_mut(a).unwrap().core.body.set_filter(1, 0);
    world.tick();
    assert!(!world.detector.is_touching(a, b));

    world.registry.get_mut(a).unwrap().core.body.set_filter(1, 1);
    world.tick();
    assert_eq!(hits_a.load(Ordering::SeqCst), 2);
}
