//! Headless dogfight: two scripted jets circle and fire until one goes down.
//!
//! Runs the simulation on its own thread, feeds scripted controls and
//! power-ups from the main thread, and prints every event as JSON.
//!
//! Run with: `RUST_LOG=info cargo run --example headless_dogfight`

use std::thread;
use std::time::{Duration, Instant};

use contrail_engine::prelude::*;

/// Give up after this much wall time even if nobody has won.
const ROUND_LIMIT: Duration = Duration::from_secs(60);

fn main() -> Result<(), anyhow::Error> {
    init_tracing("warn");

    let config = SimConfig::default();
    let playfield = config.playfield;
    let seed = config.seed;
    let (sink, events) = EventSink::bounded(1024);
    let mut sim = Simulation::new(config)?.with_event_sink(sink);
    let (p1, p2) = entities::spawn_dogfight(sim.registry_mut(), &playfield)?;

    let mut frames = 0u64;
    let running = SimulationRunner::spawn(sim, move |frame: &FrameSnapshot| {
        frames += 1;
        if frames % 500 == 0 {
            tracing::info!(
                tick = frame.tick,
                entities = frame.entities.len(),
                game_speed = frame.game_speed,
                "frame"
            );
        }
    })?;

    let controls = running.controls();
    let mut spawner = PowerUpSpawner::new(running.producer(), playfield, seed)?;
    let started = Instant::now();
    let mut last = started;
    let mut winner = None;

    while started.elapsed() < ROUND_LIMIT {
        let now = Instant::now();
        spawner.update((now - last).as_secs_f64());
        last = now;

        // Jet 1 circles tightly; jet 2 weaves every other second.
        let weave = started.elapsed().as_secs() % 2 == 0;
        controls.send(p1, Controls { forward: true, turn_left: true, shooting: true, ..Default::default() });
        controls.send(
            p2,
            Controls { forward: true, turn_right: weave, turn_left: !weave, shooting: true, ..Default::default() },
        );

        for event in events.try_iter() {
            println!("{}", serde_json::to_string(&event)?);
            if let SimEvent::PlayerDefeated { loser } = event {
                winner = Some(if loser == p1 { p2 } else { p1 });
            }
        }
        if winner.is_some() && running.game_speed().get() == 0.0 {
            break;
        }
        thread::sleep(Duration::from_millis(16));
    }

    let sim = running.shutdown()?;
    match winner {
        Some(id) => println!("winner: {id} after {:.1}s of game time", sim.game_time()),
        None => println!("no winner after {:.1}s", sim.real_time()),
    }
    Ok(())
}
