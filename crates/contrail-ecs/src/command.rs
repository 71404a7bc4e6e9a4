//! Deferred commands with causality metadata.
//!
//! Code that runs while a live collection is borrowed (entity updates,
//! collision reactions) cannot mutate the world directly. It pushes a
//! [`Command`] onto a [`CommandBuffer`] instead, and the owner drains the
//! buffer in FIFO order once the borrow ends. The payload type `K` is defined
//! by the consumer; this module only fixes ordering and metadata.
//!
//! # Example
//!
//! ```
//! use contrail_ecs::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! enum Op { Boost(f64) }
//!
//! let mut cmds = CommandBuffer::new();
//! let target = Handle::new(0, 0);
//! cmds.push(Some(target), Op::Boost(2.0), CausalReason::GameRule("pickup".into()));
//!
//! let drained = cmds.drain();
//! assert_eq!(drained.len(), 1);
//! assert_eq!(drained[0].kind, Op::Boost(2.0));
//! assert!(cmds.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

// ---------------------------------------------------------------------------
// CausalReason
// ---------------------------------------------------------------------------

/// Why a command was issued. Carried into logs when a command fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CausalReason {
    /// Driven by a control intent.
    PlayerInput(String),
    /// Raised while reacting to an overlap between two handles.
    CollisionResponse(Handle, Handle),
    /// A game rule fired (e.g. "projectile_out_of_range").
    GameRule(String),
    /// A timer elapsed.
    Timer(String),
    /// Internal bookkeeping.
    SystemInternal(String),
}

impl std::fmt::Display for CausalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CausalReason::PlayerInput(s) => write!(f, "input:{s}"),
            CausalReason::CollisionResponse(a, b) => write!(f, "collision:{a}->{b}"),
            CausalReason::GameRule(s) => write!(f, "rule:{s}"),
            CausalReason::Timer(s) => write!(f, "timer:{s}"),
            CausalReason::SystemInternal(s) => write!(f, "internal:{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One deferred mutation.
#[derive(Debug)]
pub struct Command<K> {
    /// Handle the command acts on, `None` for commands that create something.
    pub target: Option<Handle>,
    pub kind: K,
    pub reason: CausalReason,
    /// Position within the buffer since the last drain.
    pub command_index: u32,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// FIFO queue of [`Command`]s.
#[derive(Debug)]
pub struct CommandBuffer<K> {
    commands: Vec<Command<K>>,
    next_index: u32,
}

impl<K> Default for CommandBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> CommandBuffer<K> {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            next_index: 0,
        }
    }

    pub fn push(&mut self, target: Option<Handle>, kind: K, reason: CausalReason) {
        let command_index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            kind,
            reason,
            command_index,
        });
    }

    /// Queued commands in insertion order.
    pub fn commands(&self) -> &[Command<K>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command, oldest first, and reset the index counter.
    pub fn drain(&mut self) -> Vec<Command<K>> {
        self.next_index = 0;
        std::mem::take(&mut self.commands)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
