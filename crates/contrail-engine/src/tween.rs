//! Time-driven value interpolation.
//!
//! A [`Tween`] moves a value from `from` to `to` over `duration` seconds,
//! pushing every intermediate value to its consumers and firing a completion
//! callback exactly once. Tweens run on real time: the simulation hands the
//! [`TweenHandler`] unscaled dt, so slowing gameplay never stalls them.

use std::fmt;

use contrail_ecs::handle::Handle;
use contrail_ecs::pending::{LiveSet, PendingBuffer};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SimError;
use crate::math::Vec2;

/// Identity of a tween inside a [`TweenHandler`].
pub type TweenId = Handle;

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    Quadratic,
    Cubic,
}

impl Easing {
    /// Reshape linear progress in `[0, 1]`.
    pub fn apply(self, progress: f64) -> f64 {
        match self {
            Easing::Linear => progress,
            Easing::Quadratic => progress * progress,
            Easing::Cubic => progress * progress * progress,
        }
    }
}

/// Values a tween can carry.
pub trait Lerp: Copy + Send + 'static {
    fn lerp(from: Self, to: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(from: f64, to: f64, t: f64) -> f64 {
        from + (to - from) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(from: Vec2, to: Vec2, t: f64) -> Vec2 {
        crate::math::lerp(from, to, t)
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

type Consumer<T> = Box<dyn FnMut(T) + Send>;
type Completion = Box<dyn FnOnce() + Send>;

pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    duration: f64,
    elapsed: f64,
    easing: Easing,
    value: T,
    consumers: Vec<Consumer<T>>,
    on_finish: Option<Completion>,
    finished: bool,
}

impl<T: Lerp> Tween<T> {
    /// Fails with [`SimError::Configuration`] unless `duration` is positive
    /// and finite.
    pub fn new(duration: f64, from: T, to: T, easing: Easing) -> Result<Self, SimError> {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(SimError::config(format!(
                "tween duration must be positive, got {duration}"
            )));
        }
        Ok(Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
            value: from,
            consumers: Vec::new(),
            on_finish: None,
            finished: false,
        })
    }

    /// Receive every value the tween produces, in registration order.
    pub fn with_consumer(mut self, consumer: impl FnMut(T) + Send + 'static) -> Self {
        self.consumers.push(Box::new(consumer));
        self
    }

    /// Run once, on the update that reaches the end.
    pub fn on_finish(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(callback));
        self
    }

    /// Advance by `dt` seconds. Does nothing once finished.
    pub fn update(&mut self, dt: f64) {
        if self.finished {
            return;
        }
        self.elapsed += dt;
        let eased = self.easing.apply(self.progress());
        self.value = T::lerp(self.from, self.to, eased);
        for consumer in &mut self.consumers {
            consumer(self.value);
        }
        if self.elapsed >= self.duration {
            self.finished = true;
            if let Some(callback) = self.on_finish.take() {
                callback();
            }
        }
    }

    /// Last value produced, `from` before the first update.
    pub fn value(&self) -> T {
        self.value
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        (self.elapsed / self.duration).min(1.0)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T: Lerp + fmt::Debug> fmt::Debug for Tween<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("value", &self.value)
            .field("elapsed", &self.elapsed)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("consumers", &self.consumers.len())
            .field("finished", &self.finished)
            .finish()
    }
}

/// Type-erased tween driven by a [`TweenHandler`].
pub trait Animate: Send + fmt::Debug {
    fn update(&mut self, dt: f64);
    fn is_finished(&self) -> bool;
}

impl<T: Lerp + fmt::Debug> Animate for Tween<T> {
    fn update(&mut self, dt: f64) {
        Tween::update(self, dt);
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

// ---------------------------------------------------------------------------
// TweenHandler
// ---------------------------------------------------------------------------

/// Runs a batch of tweens with the same deferred add/remove discipline as the
/// entity registry. Finished tweens leave in the update that finished them.
#[derive(Debug, Default)]
pub struct TweenHandler {
    live: LiveSet<Box<dyn Animate>>,
    pending: PendingBuffer<Box<dyn Animate>>,
}

impl TweenHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a tween. It starts advancing at the next [`update`](Self::update).
    pub fn add(&mut self, tween: Box<dyn Animate>) -> TweenId {
        let id = self.live.reserve();
        self.pending.queue_add(id, tween);
        id
    }

    pub fn remove(&mut self, id: TweenId) {
        self.pending.queue_remove(id);
    }

    pub fn update(&mut self, dt: f64) {
        self.pending.flush(&mut self.live);
        let ids: Vec<TweenId> = self.live.handles().to_vec();
        for id in ids {
            let Some(tween) = self.live.get_mut(id) else {
                continue;
            };
            tween.update(dt);
            if tween.is_finished() {
                trace!(tween = %id, "tween finished");
                self.pending.queue_remove(id);
            }
        }
        self.pending.flush(&mut self.live);
    }

    /// Live tweens.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.live.contains(id)
    }

    pub fn pending(&self) -> usize {
        self.pending.pending_additions() + self.pending.pending_removals()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn zero_or_negative_duration_is_rejected() {
        assert!(matches!(Tween::new(0.0, 0.0, 1.0, Easing::Linear), Err(SimError::Configuration(_))));
        assert!(Tween::new(-1.0, 0.0, 1.0, Easing::Linear).is_err());
        assert!(Tween::new(f64::NAN, 0.0, 1.0, Easing::Linear).is_err());
    }

    #[test]
    fn linear_tween_finishes_and_stays_finished() {
        let mut t = Tween::new(1.0, 0.0, 1.0, Easing::Linear).unwrap();
        t.update(1.0);
        assert_eq!(t.value(), 1.0);
        assert!(t.is_finished());
        t.update(5.0);
        assert_eq!(t.value(), 1.0);
        assert!(t.is_finished());
    }

    #[test]
    fn easing_shapes_progress() {
        let mut q = Tween::new(2.0, 0.0, 8.0, Easing::Quadratic).unwrap();
        q.update(1.0);
        assert_eq!(q.value(), 2.0);
        let mut c = Tween::new(2.0, 0.0, 8.0, Easing::Cubic).unwrap();
        c.update(1.0);
        assert_eq!(c.value(), 1.0);
    }

    #[test]
    fn overshoot_clamps_to_target() {
        let mut t = Tween::new(0.5, 10.0, 20.0, Easing::Cubic).unwrap();
        t.update(3.0);
        assert_eq!(t.value(), 20.0);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn vector_tween_interpolates_componentwise() {
        let mut t = Tween::new(1.0, Vec2::new(0.0, 10.0), Vec2::new(4.0, 0.0), Easing::Linear).unwrap();
        t.update(0.25);
        assert_eq!(t.value(), Vec2::new(1.0, 7.5));
    }

    #[test]
    fn consumers_see_every_value_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&seen);
        let second = Arc::clone(&seen);
        let mut t = Tween::new(1.0, 0.0, 1.0, Easing::Linear)
            .unwrap()
            .with_consumer(move |v| first.lock().unwrap().push(("a", v)))
            .with_consumer(move |v| second.lock().unwrap().push(("b", v)));
        t.update(0.5);
        t.update(0.5);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", 0.5), ("b", 0.5), ("a", 1.0), ("b", 1.0)]
        );
    }

    #[test]
    fn completion_fires_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut t = Tween::new(0.1, 0.0, 1.0, Easing::Linear)
            .unwrap()
            .on_finish(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        for _ in 0..10 {
            t.update(0.05);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_defers_add_and_drops_finished_in_same_update() {
        let mut handler = TweenHandler::new();
        let id = handler.add(Box::new(Tween::new(1.0, 0.0, 1.0, Easing::Linear).unwrap()));
        assert!(!handler.contains(id));
        assert_eq!(handler.pending(), 1);

        handler.update(0.5);
        assert!(handler.contains(id));

        handler.update(0.5);
        assert!(!handler.contains(id));
        assert!(handler.is_empty());
    }

    #[test]
    fn handler_remove_before_flush_never_runs() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        let mut handler = TweenHandler::new();
        let id = handler.add(Box::new(
            Tween::new(1.0, 0.0, 1.0, Easing::Linear)
                .unwrap()
                .with_consumer(move |_| {
                    r.fetch_add(1, Ordering::SeqCst);
                }),
        ));
        handler.remove(id);
        handler.update(0.1);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(handler.is_empty());
    }
}
