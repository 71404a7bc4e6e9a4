//! Layer-masked, edge-triggered collision detection.
//!
//! Every tick each ordered pair `(a, b)` of live entities is tested. `a`
//! reacts to `b` only when `a.mask & b.layer != 0`, independently of whether
//! `b` reacts to `a`. A reaction fires once when the overlap starts; the pair
//! stays in the touch set while the overlap continues and leaves it when the
//! shapes separate.
//!
//! Touch pairs are keyed by handle, so a recycled slot never inherits a stale
//! contact. Pairs that involve a removed or destroyed entity are purged from
//! both sides before the pass runs.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

use tracing::{trace, warn};

use crate::command::TickContext;
use crate::entity::EntityId;
use crate::registry::EntityRegistry;
use crate::shape::TransformedShape;

/// What one [`CollisionDetector::update`] did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollisionReport {
    /// `(reactor, other)` in the order reactions ran.
    pub reactions: Vec<(EntityId, EntityId)>,
    /// Reactions that failed or panicked.
    pub faults: usize,
}

#[derive(Debug, Default)]
pub struct CollisionDetector {
    touching: HashSet<(EntityId, EntityId)>,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while `a` is recorded as touching `b`.
    pub fn is_touching(&self, a: EntityId, b: EntityId) -> bool {
        self.touching.contains(&(a, b))
    }

    /// Number of directed touch pairs.
    pub fn touch_count(&self) -> usize {
        self.touching.len()
    }

    /// Forget every pair involving `id`, in both directions.
    pub fn forget(&mut self, id: EntityId) {
        self.touching.retain(|&(a, b)| a != id && b != id);
    }

    pub fn update(&mut self, registry: &mut EntityRegistry, ctx: &mut TickContext<'_>) -> CollisionReport {
        self.touching.retain(|&(a, b)| is_active(registry, a) && is_active(registry, b));

        let ids = registry.live_ids();
        let shapes: HashMap<EntityId, TransformedShape> = ids
            .iter()
            .filter_map(|&id| registry.get(id).map(|e| (id, e.core.body.transformed_shape())))
            .collect();
        let mut overlaps: HashMap<(EntityId, EntityId), bool> = HashMap::new();

        let mut report = CollisionReport::default();
        for &a in &ids {
            for &b in &ids {
                if a == b {
                    continue;
                }
                // Reactions earlier in the pass may have destroyed either side.
                let filtered = match (registry.get(a), registry.get(b)) {
                    (Some(ea), Some(eb)) => ea.core.body.reacts_to(&eb.core.body),
                    _ => false,
                };
                if !filtered {
                    self.touching.remove(&(a, b));
                    continue;
                }

                let key = if a < b { (a, b) } else { (b, a) };
                let hit = *overlaps.entry(key).or_insert_with(|| match (shapes.get(&a), shapes.get(&b)) {
                    (Some(sa), Some(sb)) => sa.intersects(sb),
                    _ => false,
                });

                if !hit {
                    self.touching.remove(&(a, b));
                    continue;
                }
                if self.touching.contains(&(a, b)) {
                    continue;
                }

                if let Some((ea, eb)) = registry.get2_mut(a, b) {
                    match panic::catch_unwind(AssertUnwindSafe(|| ea.react(eb, ctx))) {
                        Ok(Ok(())) => {
                            trace!(entity = %a, other = %b, "collision");
                            report.reactions.push((a, b));
                        }
                        Ok(Err(e)) => {
                            warn!(entity = %a, other = %b, error = %e, "collision reaction failed");
                            report.faults += 1;
                        }
                        Err(_) => {
                            warn!(entity = %a, other = %b, "collision reaction panicked");
                            report.faults += 1;
                        }
                    }
                }
                self.touching.insert((a, b));
            }
        }
        report
    }
}

fn is_active(registry: &EntityRegistry, id: EntityId) -> bool {
    registry.get(id).is_some_and(|e| !e.core.is_destroyed())
}
