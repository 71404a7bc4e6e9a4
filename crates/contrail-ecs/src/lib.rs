//! Contrail ECS -- generational handles, arena storage and deferred mutation.
//!
//! This crate holds the ownership primitives the simulation kernel is built
//! on. Values live in an [`Arena`](arena::Arena) and are addressed by
//! [`Handle`](handle::Handle)s that go stale when their slot is recycled.
//! Mutations that arrive while a collection is being iterated are queued on a
//! [`PendingBuffer`](pending::PendingBuffer) or a
//! [`CommandBuffer`](command::CommandBuffer) and applied at a fixed point.
//!
//! # Quick Start
//!
//! ```
//! use contrail_ecs::prelude::*;
//!
//! let mut live: LiveSet<u32> = LiveSet::new();
//! let mut pending = PendingBuffer::new();
//!
//! let kept = live.reserve();
//! let dropped = live.reserve();
//! pending.queue_add(kept, 1);
//! pending.queue_add(dropped, 2);
//! pending.queue_remove(dropped);
//!
//! pending.flush(&mut live);
//! assert_eq!(live.handles(), &[kept]);
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod command;
pub mod handle;
pub mod pending;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by arena operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The handle's slot was released or recycled.
    #[error("handle {handle} is stale")]
    StaleHandle { handle: handle::Handle },

    /// A value was already placed under this handle.
    #[error("slot for handle {handle} is already occupied")]
    SlotOccupied { handle: handle::Handle },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::Arena;
    pub use crate::command::{CausalReason, Command, CommandBuffer};
    pub use crate::handle::{Handle, HandleAllocator};
    pub use crate::pending::{FlushReport, LiveSet, PendingBuffer};
    pub use crate::EcsError;
}
