//! Player stats

use serde::{Deserialize, Serialize};

use crate::util::time::round2;

/// Default maximum health
pub const DEFAULT_MAX_HP: f64 = 100.0;

/// Health and defensive stats of the local player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Current health, always within `[0, max_hp]`
    pub hp: f64,
    pub max_hp: f64,
    /// Subtracted from each zone's raw damage
    pub guard: f64,
    /// Tracked and displayed, no rule reads it yet
    pub resonance: f64,
}

impl PlayerStats {
    pub fn new(max_hp: f64, guard: f64, resonance: f64) -> Self {
        let max_hp = if max_hp.is_finite() && max_hp > 0.0 {
            max_hp
        } else {
            DEFAULT_MAX_HP
        };
        Self {
            hp: max_hp,
            max_hp,
            guard: guard.max(0.0),
            resonance: resonance.max(0.0),
        }
    }

    pub fn is_down(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn is_full(&self) -> bool {
        self.hp >= self.max_hp
    }

    /// Subtract damage, floored at zero. Returns the new hp.
    pub fn apply_damage(&mut self, damage: f64) -> f64 {
        if damage.is_finite() && damage > 0.0 {
            self.set_hp(self.hp - damage);
        }
        self.hp
    }

    /// Add health, capped at `max_hp`. Returns the new hp.
    pub fn heal(&mut self, amount: f64) -> f64 {
        if amount.is_finite() && amount > 0.0 {
            self.set_hp(self.hp + amount);
        }
        self.hp
    }

    fn set_hp(&mut self, hp: f64) {
        self.hp = round2(hp).clamp(0.0, self.max_hp);
    }
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HP, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_full() {
        let stats = PlayerStats::new(80.0, 1.5, 3.0);
        assert_eq!(stats.hp, 80.0);
        assert!(stats.is_full());
        assert_eq!(stats.guard, 1.5);
        assert_eq!(stats.resonance, 3.0);
    }

    #[test]
    fn test_invalid_max_hp_falls_back() {
        assert_eq!(PlayerStats::new(f64::NAN, 0.0, 0.0).max_hp, DEFAULT_MAX_HP);
        assert_eq!(PlayerStats::new(-5.0, -1.0, 0.0).guard, 0.0);
    }

    #[test]
    fn test_damage_floors_and_rounds() {
        let mut stats = PlayerStats::default();
        assert_eq!(stats.apply_damage(6.996_68), 93.0);
        assert_eq!(stats.apply_damage(500.0), 0.0);
        assert!(stats.is_down());
        assert_eq!(stats.apply_damage(f64::NAN), 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut stats = PlayerStats::default();
        stats.apply_damage(2.0);
        assert_eq!(stats.heal(1.0), 99.0);
        assert_eq!(stats.heal(3.0), 100.0);
        assert_eq!(stats.heal(-10.0), 100.0);
    }

    proptest! {
        #[test]
        fn prop_hp_stays_in_bounds(ops in proptest::collection::vec((any::<bool>(), -50.0..500.0f64), 0..200)) {
            let mut stats = PlayerStats::default();
            for (is_damage, amount) in ops {
                if is_damage {
                    stats.apply_damage(amount);
                } else {
                    stats.heal(amount);
                }
                prop_assert!(stats.hp >= 0.0 && stats.hp <= stats.max_hp);
            }
        }
    }
}
