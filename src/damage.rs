//! Damage policies.
//!
//! The battle engine asks a [`DamagePolicy`] how much health an attack removes.
//! The default policy ignores every move and creature attribute and rolls a
//! flat number; real mechanics can be plugged in behind the same signature.

use crate::battle::state::{Creature, Move};
use rand::Rng;

pub const DEFAULT_MIN_DAMAGE: i32 = 20;
pub const DEFAULT_MAX_DAMAGE: i32 = 50;

pub trait DamagePolicy: Send + Sync {
    fn damage(&self, move_used: &Move, attacker: &Creature, defender: &Creature) -> i32;
}

/// Uniform integer in `[min, max]`, independent of the move and creatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRandomDamage {
    min: i32,
    max: i32,
}

impl FlatRandomDamage {
    pub fn new(min: i32, max: i32) -> Self {
        FlatRandomDamage {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min, self.max)
    }
}

impl Default for FlatRandomDamage {
    fn default() -> Self {
        FlatRandomDamage::new(DEFAULT_MIN_DAMAGE, DEFAULT_MAX_DAMAGE)
    }
}

impl DamagePolicy for FlatRandomDamage {
    fn damage(&self, _move_used: &Move, _attacker: &Creature, _defender: &Creature) -> i32 {
        rand::rng().random_range(self.min..=self.max)
    }
}

/// Always deals the same amount. Used for scripted duels and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDamage(pub i32);

impl DamagePolicy for FixedDamage {
    fn damage(&self, _move_used: &Move, _attacker: &Creature, _defender: &Creature) -> i32 {
        self.0
    }
}

impl<F> DamagePolicy for F
where
    F: Fn(&Move, &Creature, &Creature) -> i32 + Send + Sync,
{
    fn damage(&self, move_used: &Move, attacker: &Creature, defender: &Creature) -> i32 {
        self(move_used, attacker, defender)
    }
}
