//! Fixed-tick clock and the simulation thread.
//!
//! [`FixedStep`] turns variable wall time into a whole number of fixed ticks.
//! [`SimulationRunner`] moves a [`Simulation`] onto its own thread and loops:
//! accumulate elapsed time, run that many ticks, render once. Stopping is
//! cooperative: the loop finishes its current frame, then hands the
//! simulation back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::registry::EntityProducer;
use crate::simulation::{ControlSender, FrameSnapshot, GameSpeed, Simulation};

// ---------------------------------------------------------------------------
// FixedStep
// ---------------------------------------------------------------------------

/// Wall-time accumulator for a fixed tick length.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStep {
    dt: f64,
    accumulator: f64,
    max_ticks_per_frame: u32,
    dropped: u64,
}

impl FixedStep {
    pub fn new(dt: f64, max_ticks_per_frame: u32) -> Result<Self, SimError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(SimError::config(format!("tick length must be positive, got {dt}")));
        }
        if max_ticks_per_frame == 0 {
            return Err(SimError::config("max_ticks_per_frame must be at least 1"));
        }
        Ok(Self {
            dt,
            accumulator: 0.0,
            max_ticks_per_frame,
            dropped: 0,
        })
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Add `elapsed` wall seconds and return how many ticks are due.
    ///
    /// At most `max_ticks_per_frame` ticks are returned. Whole ticks beyond
    /// that are discarded so a long stall does not snowball.
    pub fn accumulate(&mut self, elapsed: f64) -> u32 {
        self.accumulator += elapsed.max(0.0);
        let due = (self.accumulator / self.dt).floor();
        let ticks = due.min(self.max_ticks_per_frame as f64) as u32;
        self.accumulator -= ticks as f64 * self.dt;
        if due > ticks as f64 {
            let skipped = (due - ticks as f64) as u64;
            self.dropped += skipped;
            self.accumulator -= skipped as f64 * self.dt;
            warn!(skipped, "simulation fell behind, dropping ticks");
        }
        self.accumulator = self.accumulator.max(0.0);
        ticks
    }

    /// Fraction of a tick left in the accumulator.
    pub fn alpha(&self) -> f64 {
        self.accumulator / self.dt
    }

    /// Ticks discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Consumes one snapshot per frame. Never touches the simulation.
pub trait Renderer: Send {
    fn render(&mut self, frame: &FrameSnapshot);
}

impl<F> Renderer for F
where
    F: FnMut(&FrameSnapshot) + Send,
{
    fn render(&mut self, frame: &FrameSnapshot) {
        self(frame)
    }
}

/// Renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &FrameSnapshot) {}
}

// ---------------------------------------------------------------------------
// SimulationRunner
// ---------------------------------------------------------------------------

pub struct SimulationRunner;

impl SimulationRunner {
    /// Start `sim` on a dedicated thread.
    pub fn spawn(sim: Simulation, mut renderer: impl Renderer + 'static) -> Result<RunningSimulation, SimError> {
        let mut clock = FixedStep::new(sim.config().fixed_dt(), sim.config().max_ticks_per_frame)?;
        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let controls = sim.control_sender();
        let producer = sim.registry().producer();
        let speed = sim.game_speed();
        let default_timeout = sim.config().stop_timeout();

        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("contrail-sim".to_owned())
            .spawn(move || {
                let mut sim = sim;
                let dt = clock.dt();
                let mut last = Instant::now();
                info!(tick_rate = 1.0 / dt, "simulation thread started");
                while !flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    let ticks = clock.accumulate((now - last).as_secs_f64());
                    last = now;
                    for _ in 0..ticks {
                        sim.step(dt);
                    }
                    renderer.render(&sim.frame());
                    if ticks == 0 {
                        thread::yield_now();
                    }
                }
                debug!(tick = sim.tick(), dropped = clock.dropped(), "simulation thread stopping");
                // The receiver may already have given up.
                let _ = done_tx.send(sim);
            })
            .map_err(SimError::ThreadSpawn)?;

        Ok(RunningSimulation {
            stop,
            done: done_rx,
            handle: Some(handle),
            controls,
            producer,
            speed,
            default_timeout,
        })
    }
}

/// Handle to a simulation running on its own thread.
#[derive(Debug)]
pub struct RunningSimulation {
    stop: Arc<AtomicBool>,
    done: Receiver<Simulation>,
    handle: Option<JoinHandle<()>>,
    controls: ControlSender,
    producer: EntityProducer,
    speed: GameSpeed,
    default_timeout: Duration,
}

impl RunningSimulation {
    pub fn controls(&self) -> ControlSender {
        self.controls.clone()
    }

    pub fn producer(&self) -> EntityProducer {
        self.producer.clone()
    }

    pub fn game_speed(&self) -> GameSpeed {
        self.speed.clone()
    }

    /// `true` once the thread has exited, normally or not.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop with the configured `stop_timeout_ms`.
    pub fn shutdown(self) -> Result<Simulation, SimError> {
        let timeout = self.default_timeout;
        self.stop(timeout)
    }

    /// Ask the loop to stop after its current frame and wait up to `timeout`
    /// for the simulation to come back.
    pub fn stop(mut self, timeout: Duration) -> Result<Simulation, SimError> {
        self.stop.store(true, Ordering::Release);
        match self.done.recv_timeout(timeout) {
            Ok(sim) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                Ok(sim)
            }
            Err(RecvTimeoutError::Timeout) => Err(SimError::StopTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                let reason = match self.handle.take().map(JoinHandle::join) {
                    Some(Err(payload)) => panic_message(payload),
                    _ => "thread exited without returning the simulation".to_owned(),
                };
                Err(SimError::ThreadPanicked(reason))
            }
        }
    }
}

impl Drop for RunningSimulation {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_whole_ticks_and_keeps_remainder() {
        let mut clock = FixedStep::new(0.02, 8).unwrap();
        assert_eq!(clock.accumulate(0.05), 2);
        assert!((clock.alpha() - 0.5).abs() < 1e-9);
        assert_eq!(clock.accumulate(0.01), 1);
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut clock = FixedStep::new(0.02, 8).unwrap();
        assert_eq!(clock.accumulate(1.0), 8);
        assert_eq!(clock.dropped(), 42);
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn invalid_clock_is_rejected() {
        assert!(FixedStep::new(0.0, 8).is_err());
        assert!(FixedStep::new(0.02, 0).is_err());
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut clock = FixedStep::new(0.02, 8).unwrap();
        assert_eq!(clock.accumulate(-5.0), 0);
        assert_eq!(clock.alpha(), 0.0);
    }
}
