//! Generational handles and their allocator.
//!
//! A [`Handle`] names one slot of an [`Arena`](crate::arena::Arena). It packs
//! the slot's generation in the high 32 bits and the slot index in the low 32
//! bits. Freeing a slot bumps its generation, so a handle kept past removal
//! never aliases whatever is stored in the slot next.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Stable identity of a value owned by an arena.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// Never issued by an allocator. Marks values not yet owned by an arena.
    pub const DANGLING: Handle = Handle(u64::MAX);

    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// Slot index (low 32 bits).
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    /// Slot generation (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// HandleAllocator
// ---------------------------------------------------------------------------

/// Hands out [`Handle`]s and recycles released slots.
///
/// Released indices go to the back of a FIFO queue so a single hot slot does
/// not burn through its generations.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    reserved: Vec<bool>,
    free: VecDeque<u32>,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a handle. A recycled index comes back with the generation it
    /// was bumped to on release.
    pub fn allocate(&mut self) -> Handle {
        match self.free.pop_front() {
            Some(index) => {
                self.reserved[index as usize] = true;
                Handle::new(index, self.generations[index as usize])
            }
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.reserved.push(true);
                Handle::new(index, 0)
            }
        }
    }

    /// Release `handle`, invalidating every copy of it.
    ///
    /// Returns `false` when the handle was already stale.
    pub fn release(&mut self, handle: Handle) -> bool {
        if !self.is_current(handle) {
            return false;
        }
        let idx = handle.index() as usize;
        self.reserved[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push_back(handle.index());
        true
    }

    /// `true` while `handle` is reserved and its generation is current.
    pub fn is_current(&self, handle: Handle) -> bool {
        let idx = handle.index() as usize;
        idx < self.generations.len()
            && self.reserved[idx]
            && self.generations[idx] == handle.generation()
    }

    /// The live handle for slot `index`, if it is reserved.
    pub fn current_handle(&self, index: u32) -> Option<Handle> {
        let idx = index as usize;
        if idx < self.reserved.len() && self.reserved[idx] {
            Some(Handle::new(index, self.generations[idx]))
        } else {
            None
        }
    }

    /// Number of slots ever created, including free ones.
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.iter().filter(|&&r| r).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
