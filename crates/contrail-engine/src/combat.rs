//! Health, damage, timed effects and combat status.
//!
//! [`Combat`] holds the numbers. The free functions ([`damage`], [`heal`],
//! [`apply_effect`]) act on a whole [`EntityCore`] because their side effects
//! (camera trauma, notifications, an explosion on death) go through the
//! [`TickContext`].

use contrail_ecs::command::CausalReason;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::TickContext;
use crate::entities;
use crate::entity::{EntityCore, EntityKind};
use crate::error::SimError;
use crate::events::SimEvent;
use crate::kinematics::Kinematics;
use crate::stats::{Modifier, ModifierId, StatBlock, StatKey};

/// Seconds of damage immunity after a hit.
pub const IMMUNITY_DURATION: f64 = 0.5;
/// Minimum seconds between two hit notifications.
pub const HIT_CUE_INTERVAL: f64 = 0.2;
/// Camera trauma added by every hit that lands.
pub const HIT_TRAUMA: f64 = 0.19;
/// Scale of the explosion left behind on death.
pub const DEATH_EXPLOSION_SCALE: f64 = 3.0;

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EffectKind {
    /// Instant. A negative amount is dealt as damage.
    Heal { amount: f64 },
    /// Attaches a modifier to one stat for the effect's duration.
    Stat { key: StatKey, modifier: Modifier },
}

/// A power-up effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    /// Seconds. Negative lasts forever.
    pub duration: f64,
}

impl Effect {
    pub fn heal(amount: f64) -> Self {
        Self {
            kind: EffectKind::Heal { amount },
            duration: 0.0,
        }
    }

    /// Multiplicative effects scale the base value, additive ones add to it.
    pub fn stat(key: StatKey, value: f64, multiplicative: bool, duration: f64) -> Self {
        let modifier = if multiplicative {
            Modifier::base_multiplier(value)
        } else {
            Modifier::additive(value)
        };
        Self {
            kind: EffectKind::Stat { key, modifier },
            duration,
        }
    }

    /// Like [`stat`](Self::stat) but with the stat given by name.
    pub fn stat_named(
        name: &str,
        value: f64,
        multiplicative: bool,
        duration: f64,
    ) -> Result<Self, SimError> {
        Ok(Self::stat(name.parse()?, value, multiplicative, duration))
    }

    pub fn stat_key(&self) -> Option<StatKey> {
        match self.kind {
            EffectKind::Stat { key, .. } => Some(key),
            EffectKind::Heal { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveEffect {
    effect: Effect,
    elapsed: f64,
    modifier: Option<ModifierId>,
}

impl ActiveEffect {
    fn expired(&self) -> bool {
        self.effect.duration >= 0.0 && self.elapsed >= self.effect.duration
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Result of a damage attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Blocked by immunity.
    Ignored,
    /// Damage landed. `cue` is set when a hit notification is due.
    Hit { remaining: f64, cue: bool },
    /// Health reached zero.
    Lethal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Combat {
    pub stats: StatBlock,
    health: f64,
    immunity_timer: f64,
    hit_cue_timer: f64,
    effects: Vec<ActiveEffect>,
    shot_timer: f64,
    spin_timer: f64,
}

impl Default for Combat {
    fn default() -> Self {
        Self::new(StatBlock::jet_defaults())
    }
}

impl Combat {
    /// Starts at full health.
    pub fn new(stats: StatBlock) -> Self {
        let health = stats.get(StatKey::MaxHealth);
        Self {
            stats,
            health,
            immunity_timer: 0.0,
            hit_cue_timer: 0.0,
            effects: Vec::new(),
            shot_timer: 0.0,
            spin_timer: 0.0,
        }
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn set_health(&mut self, health: f64) {
        self.health = health;
    }

    pub fn max_health(&self) -> f64 {
        self.stats.get(StatKey::MaxHealth)
    }

    pub fn is_immune(&self) -> bool {
        self.immunity_timer > 0.0
    }

    pub fn is_spinning(&self) -> bool {
        self.spin_timer > 0.0
    }

    /// Spinning takes the jet out of its pilot's hands.
    pub fn can_control(&self) -> bool {
        !self.is_spinning()
    }

    pub fn can_shoot(&self) -> bool {
        !self.is_spinning()
    }

    pub fn active_effects(&self) -> usize {
        self.effects.len()
    }

    /// Raise health by `amount`, never above max health. Returns the gain.
    pub fn restore(&mut self, amount: f64) -> f64 {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health());
        self.health - before
    }

    /// Lower health by `amount`. Unless `ignore_immunity` is set, a landed
    /// hit grants [`IMMUNITY_DURATION`] seconds of immunity.
    pub fn take_damage(&mut self, amount: f64, ignore_immunity: bool) -> DamageOutcome {
        if !ignore_immunity && self.is_immune() {
            return DamageOutcome::Ignored;
        }
        self.health -= amount;
        if !ignore_immunity {
            self.immunity_timer = IMMUNITY_DURATION;
        }
        if self.health <= 0.0 {
            return DamageOutcome::Lethal;
        }
        let cue = self.hit_cue_timer <= 0.0;
        if cue {
            self.hit_cue_timer = HIT_CUE_INTERVAL;
        }
        DamageOutcome::Hit {
            remaining: self.health,
            cue,
        }
    }

    /// Start spinning in `direction` (sign only) for `duration` seconds.
    pub fn start_spin(&mut self, kinematics: &mut Kinematics, direction: f64, duration: f64) {
        let dir = if direction < 0.0 { -1.0 } else { 1.0 };
        kinematics.angular_velocity = dir * self.stats.get(StatKey::SpinSpeed);
        self.spin_timer = duration;
    }

    /// Advance effect timers and drop expired effects.
    pub fn tick_effects(&mut self, dt: f64) {
        for active in &mut self.effects {
            active.elapsed += dt;
        }
        let stats = &mut self.stats;
        self.effects.retain(|active| {
            if !active.expired() {
                return true;
            }
            if let (EffectKind::Stat { key, .. }, Some(id)) = (active.effect.kind, active.modifier) {
                stats.remove_modifier(key, id);
            }
            false
        });
    }

    /// Volleys due this tick given the current shot delay.
    pub fn tick_shots(&mut self, dt: f64, shooting: bool) -> u32 {
        let delay = self.stats.get(StatKey::ShotDelay);
        if self.shot_timer < delay {
            self.shot_timer += dt;
        }
        if !(shooting && self.can_shoot()) {
            return 0;
        }
        if delay <= 0.0 {
            return 1;
        }
        let mut volleys = 0;
        while self.shot_timer >= delay {
            volleys += 1;
            self.shot_timer -= delay;
        }
        volleys
    }

    /// Count down spin, immunity and the hit cue throttle.
    pub fn tick_status(&mut self, dt: f64) {
        self.spin_timer = (self.spin_timer - dt).max(0.0);
        self.immunity_timer = (self.immunity_timer - dt).max(0.0);
        if self.hit_cue_timer > 0.0 {
            self.hit_cue_timer -= dt;
        }
    }

    /// Attach a stat effect. If an effect on the same stat is already active
    /// its timer restarts instead and `true` is returned.
    fn attach(&mut self, effect: Effect) -> bool {
        let EffectKind::Stat { key, modifier } = effect.kind else {
            return false;
        };
        if let Some(existing) = self
            .effects
            .iter_mut()
            .find(|a| a.effect.stat_key() == Some(key))
        {
            existing.elapsed = 0.0;
            return true;
        }
        let id = self.stats.add_modifier(key, modifier);
        self.effects.push(ActiveEffect {
            effect,
            elapsed: 0.0,
            modifier: Some(id),
        });
        false
    }
}

// ---------------------------------------------------------------------------
// Entity-level operations
// ---------------------------------------------------------------------------

/// Deal `amount` damage to `core`. Entities without combat ignore it.
pub fn damage(
    core: &mut EntityCore,
    amount: f64,
    ignore_immunity: bool,
    ctx: &mut TickContext<'_>,
) -> DamageOutcome {
    let id = core.id();
    if core.is_destroyed() {
        return DamageOutcome::Ignored;
    }
    let Some(combat) = core.combat.as_mut() else {
        return DamageOutcome::Ignored;
    };
    let outcome = combat.take_damage(amount, ignore_immunity);
    if outcome == DamageOutcome::Ignored {
        return outcome;
    }
    ctx.add_trauma(HIT_TRAUMA, CausalReason::GameRule("hit_shake".to_owned()));
    match outcome {
        DamageOutcome::Lethal => die(core, ctx),
        DamageOutcome::Hit { remaining, cue: true } => ctx.notify(SimEvent::Hit {
            entity: id,
            amount,
            remaining,
        }),
        _ => {}
    }
    outcome
}

/// Heal `core` by `amount`, capped at max health.
pub fn heal(core: &mut EntityCore, amount: f64, ctx: &mut TickContext<'_>) {
    let id = core.id();
    if let Some(combat) = core.combat.as_mut() {
        let gained = combat.restore(amount);
        ctx.notify(SimEvent::Healed { entity: id, amount: gained });
    }
}

/// Leave an explosion behind, notify and destroy. Players also end the round.
pub fn die(core: &mut EntityCore, ctx: &mut TickContext<'_>) {
    let id = core.id();
    debug!(entity = %id, kind = core.kind.name(), "entity died");
    match entities::explosion(core.body.position, DEATH_EXPLOSION_SCALE) {
        Ok(explosion) => ctx.spawn(explosion, CausalReason::GameRule("death_explosion".to_owned())),
        Err(e) => tracing::warn!(entity = %id, error = %e, "could not build death explosion"),
    }
    ctx.notify(SimEvent::Died { entity: id });
    if let EntityKind::Player { .. } = core.kind {
        ctx.game_over(id, CausalReason::GameRule("player_died".to_owned()));
    }
    core.destroy();
}

/// Apply a power-up effect. Heals act at once, stat effects attach for their
/// duration.
pub fn apply_effect(core: &mut EntityCore, effect: Effect, ctx: &mut TickContext<'_>) {
    if core.combat.is_none() {
        return;
    }
    match effect.kind {
        EffectKind::Heal { amount } if amount >= 0.0 => heal(core, amount, ctx),
        EffectKind::Heal { amount } => {
            damage(core, -amount, false, ctx);
        }
        EffectKind::Stat { key, .. } => {
            let id = core.id();
            let refreshed = core.combat.as_mut().is_some_and(|c| c.attach(effect));
            ctx.notify(SimEvent::EffectApplied {
                entity: id,
                stat: Some(key),
                refreshed,
            });
        }
    }
}
