//! Modifiable numeric stats.
//!
//! Every combat-capable entity owns a [`StatBlock`]: one [`Stat`] per
//! [`StatKey`]. A stat's effective value is
//!
//! ```text
//! (base * product(base multipliers) + sum(additives)) * product(full multipliers)
//! ```
//!
//! Modifiers are added and removed by [`ModifierId`], so removing one never
//! disturbs another with the same value. Stat names only appear at the parsing
//! boundary ([`StatKey::from_str`]), where an unknown name is a
//! [`SimError::LookupMiss`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ---------------------------------------------------------------------------
// StatKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    Speed,
    RotationSpeed,
    ProjectileSpeed,
    ShotDelay,
    ShootKnockback,
    SpinSpeed,
    MaxHealth,
    ProjectileDamage,
}

impl StatKey {
    pub const ALL: [StatKey; 8] = [
        StatKey::Speed,
        StatKey::RotationSpeed,
        StatKey::ProjectileSpeed,
        StatKey::ShotDelay,
        StatKey::ShootKnockback,
        StatKey::SpinSpeed,
        StatKey::MaxHealth,
        StatKey::ProjectileDamage,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatKey::Speed => "speed",
            StatKey::RotationSpeed => "rotation_speed",
            StatKey::ProjectileSpeed => "projectile_speed",
            StatKey::ShotDelay => "shot_delay",
            StatKey::ShootKnockback => "shoot_knockback",
            StatKey::SpinSpeed => "spin_speed",
            StatKey::MaxHealth => "max_health",
            StatKey::ProjectileDamage => "projectile_damage",
        }
    }

    /// Base value on a freshly built jet.
    pub fn jet_default(self) -> f64 {
        match self {
            StatKey::Speed => 150.0,
            StatKey::RotationSpeed => 2.0,
            StatKey::ProjectileSpeed => 300.0,
            StatKey::ShotDelay => 0.25,
            StatKey::ShootKnockback => 8.0,
            StatKey::SpinSpeed => 6.0,
            StatKey::MaxHealth => 100.0,
            StatKey::ProjectileDamage => 5.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StatKey {
    type Err = SimError;

    /// Accepts `snake_case` and `camelCase` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        StatKey::ALL
            .into_iter()
            .find(|k| k.name().replace('_', "") == folded)
            .ok_or_else(|| SimError::LookupMiss {
                name: s.to_owned(),
                known: StatKey::ALL.map(StatKey::name).join(", "),
            })
    }
}

// ---------------------------------------------------------------------------
// Modifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Multiplies the base value before additives.
    BaseMultiplier,
    /// Added after base multipliers.
    Additive,
    /// Multiplies the final sum.
    FullMultiplier,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub value: f64,
}

impl Modifier {
    pub fn base_multiplier(value: f64) -> Self {
        Self { kind: ModifierKind::BaseMultiplier, value }
    }

    pub fn additive(value: f64) -> Self {
        Self { kind: ModifierKind::Additive, value }
    }

    pub fn full_multiplier(value: f64) -> Self {
        Self { kind: ModifierKind::FullMultiplier, value }
    }
}

/// Ticket returned by [`StatBlock::add_modifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModifierId(u32);

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    base: f64,
    modifiers: Vec<(ModifierId, Modifier)>,
}

impl Stat {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            modifiers: Vec::new(),
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn value(&self) -> f64 {
        let mut base = self.base;
        let mut additive = 0.0;
        let mut full = 1.0;
        for (_, m) in &self.modifiers {
            match m.kind {
                ModifierKind::BaseMultiplier => base *= m.value,
                ModifierKind::Additive => additive += m.value,
                ModifierKind::FullMultiplier => full *= m.value,
            }
        }
        (base + additive) * full
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }
}

// ---------------------------------------------------------------------------
// StatBlock
// ---------------------------------------------------------------------------

/// One [`Stat`] per [`StatKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct StatBlock {
    stats: [Stat; 8],
    next_modifier: u32,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::jet_defaults()
    }
}

impl StatBlock {
    pub fn jet_defaults() -> Self {
        Self {
            stats: StatKey::ALL.map(|k| Stat::new(k.jet_default())),
            next_modifier: 0,
        }
    }

    /// Override a base value.
    pub fn with_base(mut self, key: StatKey, base: f64) -> Self {
        self.stats[key.index()].base = base;
        self
    }

    pub fn get(&self, key: StatKey) -> f64 {
        self.stats[key.index()].value()
    }

    pub fn stat(&self, key: StatKey) -> &Stat {
        &self.stats[key.index()]
    }

    pub fn add_modifier(&mut self, key: StatKey, modifier: Modifier) -> ModifierId {
        let id = ModifierId(self.next_modifier);
        self.next_modifier = self.next_modifier.wrapping_add(1);
        self.stats[key.index()].modifiers.push((id, modifier));
        id
    }

    /// Returns `false` if `id` is not attached to `key`.
    pub fn remove_modifier(&mut self, key: StatKey, id: ModifierId) -> bool {
        let mods = &mut self.stats[key.index()].modifiers;
        match mods.iter().position(|(m, _)| *m == id) {
            Some(pos) => {
                mods.remove(pos);
                true
            }
            None => false,
        }
    }
}
