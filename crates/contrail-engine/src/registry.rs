//! The live entity set.
//!
//! Entities are added and removed through a [`PendingBuffer`] and only change
//! membership at the start of [`EntityRegistry::update`]: removals first, then
//! additions, then every live entity is updated. An entity flagged destroyed
//! is queued for removal instead of updated, so it disappears at the following
//! flush.
//!
//! Producers on other threads (spawners) hand entities over through an
//! [`EntityProducer`]; those are drained into the pending buffer at the top of
//! each update.

use std::panic::{self, AssertUnwindSafe};

use contrail_ecs::pending::{FlushReport, LiveSet, PendingBuffer};
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::command::TickContext;
use crate::entity::{Entity, EntityId, EntityView};
use crate::error::SimError;
use crate::math::Transform2D;

// ---------------------------------------------------------------------------
// EntityProducer
// ---------------------------------------------------------------------------

/// Cross-thread handle for adding entities to a registry.
#[derive(Debug, Clone)]
pub struct EntityProducer {
    tx: Sender<Entity>,
}

impl EntityProducer {
    /// Returns `false` once the registry is gone.
    pub fn send(&self, entity: Entity) -> bool {
        self.tx.send(entity).is_ok()
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// What one [`EntityRegistry::update`] did.
#[derive(Debug, Default)]
pub struct RegistryReport {
    pub flush: FlushReport,
    /// Entities whose update ran to completion.
    pub updated: usize,
    /// Entities whose update failed or panicked.
    pub faults: usize,
}

#[derive(Debug)]
pub struct EntityRegistry {
    live: LiveSet<Entity>,
    pending: PendingBuffer<Entity>,
    inbox_tx: Sender<Entity>,
    inbox_rx: Receiver<Entity>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        let (inbox_tx, inbox_rx) = crossbeam_channel::unbounded();
        Self {
            live: LiveSet::new(),
            pending: PendingBuffer::new(),
            inbox_tx,
            inbox_rx,
        }
    }

    /// Queue `entity`. Its id is valid at once, but it is not live until the
    /// next [`update`](Self::update).
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = self.reserve_id();
        self.add_reserved(id, entity);
        id
    }

    /// Reserve an id ahead of building the entity, for entities that must
    /// know each other's ids before either is added.
    pub fn reserve_id(&mut self) -> EntityId {
        self.live.reserve()
    }

    /// Queue `entity` under an id from [`reserve_id`](Self::reserve_id).
    pub fn add_reserved(&mut self, id: EntityId, mut entity: Entity) {
        entity.core.assign_id(id);
        self.pending.queue_add(id, entity);
    }

    /// Queue `id` for removal at the next flush. Removing an entity that is
    /// still pending cancels its addition.
    pub fn remove(&mut self, id: EntityId) {
        self.pending.queue_remove(id);
    }

    pub fn producer(&self) -> EntityProducer {
        EntityProducer {
            tx: self.inbox_tx.clone(),
        }
    }

    /// Flush pending mutations, then update every live entity.
    ///
    /// A failing or panicking entity is logged and skipped; the rest of the
    /// tick runs normally.
    pub fn update(&mut self, dt: f64, ctx: &mut TickContext<'_>) -> RegistryReport {
        let produced: Vec<Entity> = self.inbox_rx.try_iter().collect();
        for entity in produced {
            let id = self.add(entity);
            trace!(entity = %id, "adopted produced entity");
        }

        let flush = self.pending.flush(&mut self.live);
        if !flush.is_empty() {
            debug!(
                added = flush.added.len(),
                removed = flush.removed.len(),
                cancelled = flush.cancelled.len(),
                "registry flush"
            );
        }

        let mut report = RegistryReport {
            flush,
            ..Default::default()
        };
        let ids: Vec<EntityId> = self.live.handles().to_vec();
        for id in ids {
            let Some(entity) = self.live.get_mut(id) else {
                continue;
            };
            if entity.core.is_destroyed() {
                self.pending.queue_remove(id);
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| entity.update(dt, ctx))) {
                Ok(Ok(())) => report.updated += 1,
                Ok(Err(e)) => {
                    warn!(entity = %id, behavior = entity.behavior_name(), error = %e, "entity update failed");
                    report.faults += 1;
                }
                Err(_) => {
                    warn!(entity = %id, behavior = entity.behavior_name(), "entity update panicked");
                    report.faults += 1;
                }
            }
        }
        report
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.live.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.get_mut(id)
    }

    /// Two distinct live entities at once.
    pub fn get2_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        self.live.get2_mut(a, b)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains(id)
    }

    /// Live ids in insertion order.
    pub fn live_ids(&self) -> Vec<EntityId> {
        self.live.handles().to_vec()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Whether `id` is queued for addition and not yet live.
    pub fn is_pending_add(&self, id: EntityId) -> bool {
        self.pending.is_pending_add(id)
    }

    /// Additions and removals waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.pending.pending_additions() + self.pending.pending_removals()
    }

    /// Independent copy of the live set.
    pub fn snapshot(&self) -> Vec<EntityView> {
        self.live.iter().map(|(_, e)| e.core.view()).collect()
    }

    /// Live entities with the inverse of their transform, for restoring a
    /// drawing context. Entities with a singular transform are logged and
    /// left out.
    pub fn draw_list(&self) -> Vec<(EntityView, Transform2D)> {
        self.live
            .iter()
            .filter_map(|(id, e)| {
                let view = e.core.view();
                match invert(id, &view.transform) {
                    Ok(inverse) => Some((view, inverse)),
                    Err(e) => {
                        warn!(entity = %id, error = %e, "skipping entity in draw list");
                        None
                    }
                }
            })
            .collect()
    }
}

fn invert(id: EntityId, transform: &Transform2D) -> Result<Transform2D, SimError> {
    transform.try_inverse().ok_or(SimError::TransformDegenerate {
        entity: id,
        determinant: transform.determinant(),
    })
}
