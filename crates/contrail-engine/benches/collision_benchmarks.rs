//! Collision and tick throughput.
//!
//! The detector tests every ordered pair, so cost grows quadratically with
//! the live entity count. These benchmarks track a full detection pass and a
//! full simulation step at sizes typical of a busy dogfight.
//!
//! Run with: `cargo bench --bench collision_benchmarks`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use contrail_engine::entity::Inert;
use contrail_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `count` static squares laid out on a grid, every other one overlapping
/// its neighbour.
fn populated_registry(count: usize) -> EntityRegistry {
    let mut registry = EntityRegistry::new();
    let shape = Arc::new(Shape::rect(10.0, 10.0).expect("valid shape"));
    for i in 0..count {
        let x = (i % 40) as f64 * 16.0 + if i % 2 == 0 { 0.0 } else { -8.0 };
        let y = (i / 40) as f64 * 16.0;
        let body = Body::new(Vec2::new(x, y), Arc::clone(&shape), layers::PLAYER, layers::PLAYER);
        registry.add(Entity::new(EntityCore::new(EntityKind::Prop, body), Inert));
    }
    let mut commands: SimCommands = CommandBuffer::new();
    let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
    registry.update(0.0, &mut ctx);
    registry
}

// ---------------------------------------------------------------------------
// Benchmark 1: detection pass
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collision_pass");
    for count in [16usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut registry = populated_registry(count);
            let mut detector = CollisionDetector::new();
            let mut commands: SimCommands = CommandBuffer::new();
            b.iter(|| {
                // Fresh state each pass so every overlap is an entry.
                detector = CollisionDetector::new();
                let mut ctx = TickContext::new(&mut commands, Playfield::default(), 0);
                black_box(detector.update(&mut registry, &mut ctx));
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 2: full step
// ---------------------------------------------------------------------------

fn bench_dogfight_step(c: &mut Criterion) {
    c.bench_function("dogfight_step", |b| {
        let config = SimConfig::default();
        let playfield = config.playfield;
        let mut sim = Simulation::new(config).expect("default config is valid");
        let (p1, p2) = entities::spawn_dogfight(sim.registry_mut(), &playfield).expect("two players");
        sim.step(0.02);
        let input = sim.control_sender();
        let circling = Controls {
            forward: true,
            turn_left: true,
            shooting: true,
            ..Default::default()
        };
        b.iter(|| {
            input.send(p1, circling);
            input.send(p2, circling);
            black_box(sim.step(0.02));
        });
    });
}

criterion_group!(benches, bench_detection, bench_dogfight_step);
criterion_main!(benches);
