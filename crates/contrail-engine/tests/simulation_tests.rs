//! Whole-tick behaviour of the simulation driver.
//!
//! Validates:
//! 1. Game speed scales entity motion but never tween time
//! 2. A lethal hit ends the round and slows gameplay to a halt over two
//!    real seconds
//! 3. Only the first defeat counts

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contrail_engine::prelude::*;
use contrail_engine::simulation::GAME_OVER_SLOWDOWN;

const DT: f64 = 0.02;

fn dogfight() -> (Simulation, crossbeam_channel::Receiver<SimEvent>, EntityId, EntityId) {
    let config = SimConfig::default();
    let playfield = config.playfield;
    let (sink, events) = EventSink::bounded(256);
    let mut sim = Simulation::new(config).unwrap().with_event_sink(sink);
    let (p1, p2) = entities::spawn_dogfight(sim.registry_mut(), &playfield).unwrap();
    sim.step(DT);
    (sim, events, p1, p2)
}

/// Queue a bullet from `shooter` sitting on top of `target`.
fn fire_point_blank(sim: &mut Simulation, shooter: EntityId, slot: u8, target: EntityId, damage: f64) {
    let at = sim.registry().get(target).unwrap().core.center();
    let bullet = entities::projectile(shooter, slot, at, Vec2::new(0.0, -1.0), damage).unwrap();
    sim.add(bullet);
}

// ---------------------------------------------------------------------------
// Time bases
// ---------------------------------------------------------------------------

#[test]
fn zero_game_speed_freezes_entities_but_not_tweens() {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    let pickup = sim.add(entities::power_up(PowerUpKind::HealthKit, Vec2::new(100.0, 10.0)).unwrap());
    sim.game_speed().set(0.0);

    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let tween = Tween::new(1.0, 0.0, 1.0, Easing::Linear).unwrap().on_finish(move || {
        flag.store(true, Ordering::SeqCst);
    });
    sim.tweens_mut().add(Box::new(tween));

    for _ in 0..60 {
        let report = sim.step(DT);
        assert_eq!(report.dt, 0.0);
    }
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(sim.registry().get(pickup).unwrap().core.body.position, Vec2::new(100.0, 10.0));
    assert_eq!(sim.game_time(), 0.0);
    assert!((sim.real_time() - 60.0 * DT).abs() < 1e-9);
}

#[test]
fn half_speed_halves_distance() {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();
    let pickup = sim.add(entities::power_up(PowerUpKind::HealthKit, Vec2::new(100.0, 0.0)).unwrap());
    sim.game_speed().set(0.5);
    for _ in 0..50 {
        sim.step(DT);
    }
    let y = sim.registry().get(pickup).unwrap().core.body.position.y;
    assert!((y - entities::POWER_UP_FALL_SPEED * 0.5).abs() < 1e-6, "y = {y}");
}

// ---------------------------------------------------------------------------
// Game over
// ---------------------------------------------------------------------------

#[test]
fn lethal_hit_ends_the_round() {
    let (mut sim, events, p1, p2) = dogfight();
    fire_point_blank(&mut sim, p2, 2, p1, 1_000.0);
    sim.step(DT);

    assert_eq!(sim.loser(), Some(p1));
    assert!(sim.registry().get(p1).map_or(true, |e| e.core.is_destroyed()));

    let seen: Vec<SimEvent> = events.try_iter().collect();
    assert!(seen.contains(&SimEvent::Died { entity: p1 }));
    assert!(seen.contains(&SimEvent::PlayerDefeated { loser: p1 }));
}

#[test]
fn game_over_slows_to_a_halt_in_real_time() {
    let (mut sim, _events, p1, p2) = dogfight();
    fire_point_blank(&mut sim, p2, 2, p1, 1_000.0);
    sim.step(DT);
    assert_eq!(sim.loser(), Some(p1));

    // Halfway through the slowdown.
    let half = (GAME_OVER_SLOWDOWN / 2.0 / DT).round() as usize - 1;
    for _ in 0..half {
        sim.step(DT);
    }
    let speed = sim.game_speed().get();
    assert!((speed - 0.5).abs() < 0.05, "speed = {speed}");

    for _ in 0..60 {
        sim.step(DT);
    }
    assert_eq!(sim.game_speed().get(), 0.0);

    let frozen = sim.game_time();
    for _ in 0..10 {
        sim.step(DT);
    }
    assert_eq!(sim.game_time(), frozen);
}

#[test]
fn only_first_defeat_counts() {
    let (mut sim, events, p1, p2) = dogfight();
    fire_point_blank(&mut sim, p2, 2, p1, 1_000.0);
    fire_point_blank(&mut sim, p1, 1, p2, 1_000.0);
    sim.step(DT);

    let defeats = events
        .try_iter()
        .filter(|e| matches!(e, SimEvent::PlayerDefeated { .. }))
        .count();
    assert_eq!(defeats, 1);
    assert!(sim.loser().is_some());
}

#[test]
fn destroyed_entities_leave_the_registry() {
    let (mut sim, events, p1, p2) = dogfight();
    fire_point_blank(&mut sim, p2, 2, p1, 1_000.0);
    // Destroyed during this tick, queued for removal on the next, gone on
    // the one after.
    sim.step(DT);
    sim.step(DT);
    sim.step(DT);

    assert!(!sim.registry().contains(p1));
    assert!(sim.registry().contains(p2));
    assert!(!sim.collisions().is_touching(p1, p2));
    assert!(events.try_iter().any(|e| e == SimEvent::EntityDestroyed { entity: p1 }));
}
