//! Two-phase mutation of an ordered live collection.
//!
//! Producers never touch a [`LiveSet`] while it is being iterated. They queue
//! additions and removals on a [`PendingBuffer`], and the owner applies them in
//! one [`PendingBuffer::flush`] at a fixed point of its update:
//!
//! 1. Removals first. A removal that targets a still-queued addition cancels
//!    it, so the value never becomes live.
//! 2. Remaining additions, in the order they were queued.
//!
//! The entity registry and the tween handler both run on this type.
//!
//! # Example
//!
//! ```
//! use contrail_ecs::prelude::*;
//!
//! let mut live: LiveSet<&str> = LiveSet::new();
//! let mut pending = PendingBuffer::new();
//!
//! let a = live.reserve();
//! pending.queue_add(a, "alpha");
//! assert!(live.get(a).is_none());
//!
//! let report = pending.flush(&mut live);
//! assert_eq!(report.added, vec![a]);
//! assert_eq!(live.get(a), Some(&"alpha"));
//! ```

use tracing::{debug, warn};

use crate::arena::Arena;
use crate::handle::Handle;

// ---------------------------------------------------------------------------
// LiveSet
// ---------------------------------------------------------------------------

/// Arena storage plus the insertion order of its live values.
#[derive(Debug)]
pub struct LiveSet<T> {
    arena: Arena<T>,
    order: Vec<Handle>,
}

impl<T> Default for LiveSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LiveSet<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            order: Vec::new(),
        }
    }

    /// Reserve a handle for a value that will arrive through a flush.
    pub fn reserve(&mut self) -> Handle {
        self.arena.reserve()
    }

    /// Live handles in insertion order.
    pub fn handles(&self) -> &[Handle] {
        &self.order
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.arena.get_mut(handle)
    }

    pub fn get2_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut T, &mut T)> {
        self.arena.get2_mut(a, b)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.arena.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&h| self.arena.get(h).map(|v| (h, v)))
    }

    fn take(&mut self, handle: Handle) -> Option<T> {
        let value = self.arena.remove(handle)?;
        self.order.retain(|&h| h != handle);
        Some(value)
    }

    fn release_reservation(&mut self, handle: Handle) {
        self.arena.remove(handle);
    }
}

// ---------------------------------------------------------------------------
// FlushReport
// ---------------------------------------------------------------------------

/// What one [`PendingBuffer::flush`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Live values taken out, in removal order.
    pub removed: Vec<Handle>,
    /// Values that became live, in queue order.
    pub added: Vec<Handle>,
    /// Additions cancelled by a removal in the same batch.
    pub cancelled: Vec<Handle>,
    /// Removals that named nothing live or pending.
    pub stale_removals: usize,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.added.is_empty()
            && self.cancelled.is_empty()
            && self.stale_removals == 0
    }
}

// ---------------------------------------------------------------------------
// PendingBuffer
// ---------------------------------------------------------------------------

/// Queued additions and removals for a [`LiveSet`].
#[derive(Debug)]
pub struct PendingBuffer<T> {
    additions: Vec<(Handle, T)>,
    removals: Vec<Handle>,
}

impl<T> Default for PendingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PendingBuffer<T> {
    pub fn new() -> Self {
        Self {
            additions: Vec::new(),
            removals: Vec::new(),
        }
    }

    /// Queue `value` to go live under `handle` at the next flush.
    pub fn queue_add(&mut self, handle: Handle, value: T) {
        self.additions.push((handle, value));
    }

    /// Queue `handle` for removal at the next flush. Duplicates are ignored.
    pub fn queue_remove(&mut self, handle: Handle) {
        if !self.removals.contains(&handle) {
            self.removals.push(handle);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn pending_additions(&self) -> usize {
        self.additions.len()
    }

    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    /// `true` if `handle` is queued to go live.
    pub fn is_pending_add(&self, handle: Handle) -> bool {
        self.additions.iter().any(|(h, _)| *h == handle)
    }

    /// Apply every queued mutation to `live`: removals, then additions.
    pub fn flush(&mut self, live: &mut LiveSet<T>) -> FlushReport {
        let mut report = FlushReport::default();
        let mut additions = std::mem::take(&mut self.additions);

        for handle in self.removals.drain(..) {
            if let Some(pos) = additions.iter().position(|(h, _)| *h == handle) {
                additions.remove(pos);
                live.release_reservation(handle);
                report.cancelled.push(handle);
            } else if live.take(handle).is_some() {
                report.removed.push(handle);
            } else {
                report.stale_removals += 1;
                debug!(%handle, "removal named nothing live");
            }
        }

        for (handle, value) in additions {
            match live.arena.place(handle, value) {
                Ok(()) => {
                    live.order.push(handle);
                    report.added.push(handle);
                }
                Err(e) => warn!(%handle, error = %e, "dropping queued addition"),
            }
        }

        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
