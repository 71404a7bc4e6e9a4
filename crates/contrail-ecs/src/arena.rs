//! Slot storage addressed by generational [`Handle`]s.
//!
//! An [`Arena`] separates *reserving* a handle from *filling* its slot. A
//! producer can hand out a handle the moment a value is queued and the value
//! only becomes reachable through [`Arena::get`] once it is placed, which is
//! what the deferred-add buffers in the engine rely on.

use crate::handle::{Handle, HandleAllocator};
use crate::EcsError;

/// Generational slot map.
#[derive(Debug)]
pub struct Arena<T> {
    allocator: HandleAllocator,
    slots: Vec<Option<T>>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            allocator: HandleAllocator::new(),
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Reserve a handle without storing anything under it yet.
    pub fn reserve(&mut self) -> Handle {
        let handle = self.allocator.allocate();
        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        handle
    }

    /// Store `value` under a handle previously returned by [`reserve`](Self::reserve).
    pub fn place(&mut self, handle: Handle, value: T) -> Result<(), EcsError> {
        if !self.allocator.is_current(handle) {
            return Err(EcsError::StaleHandle { handle });
        }
        let slot = &mut self.slots[handle.index() as usize];
        if slot.is_some() {
            return Err(EcsError::SlotOccupied { handle });
        }
        *slot = Some(value);
        self.len += 1;
        Ok(())
    }

    /// Reserve and fill in one step.
    pub fn insert(&mut self, value: T) -> Handle {
        let handle = self.reserve();
        self.slots[handle.index() as usize] = Some(value);
        self.len += 1;
        handle
    }

    /// Release `handle` and return its value, if one was placed.
    ///
    /// Releasing a reserved-but-empty handle frees the slot and returns `None`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.allocator.release(handle) {
            return None;
        }
        let value = self.slots[handle.index() as usize].take();
        if value.is_some() {
            self.len -= 1;
        }
        value
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if !self.allocator.is_current(handle) {
            return None;
        }
        self.slots[handle.index() as usize].as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if !self.allocator.is_current(handle) {
            return None;
        }
        self.slots[handle.index() as usize].as_mut()
    }

    /// Borrow two distinct values mutably at once.
    ///
    /// Returns `None` if the handles are equal or either is missing.
    pub fn get2_mut(&mut self, a: Handle, b: Handle) -> Option<(&mut T, &mut T)> {
        if a.index() == b.index() {
            return None;
        }
        if !self.allocator.is_current(a) || !self.allocator.is_current(b) {
            return None;
        }
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        let (first, second) = if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            (&mut lo[ia], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            (&mut hi[0], &mut lo[ib])
        };
        match (first.as_mut(), second.as_mut()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    /// `true` when `handle` is current and has a value placed.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// `true` when `handle` is current, placed or not.
    pub fn is_reserved(&self, handle: Handle) -> bool {
        self.allocator.is_current(handle)
    }

    /// Number of placed values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Placed values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(move |(idx, slot)| {
            let value = slot.as_ref()?;
            let handle = self.allocator.current_handle(idx as u32)?;
            Some((handle, value))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
