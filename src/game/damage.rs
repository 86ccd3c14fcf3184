//! Damage model - proximity to damage, mitigation and haptic stages

use serde::{Deserialize, Serialize};

use super::zone::DamageProfile;

/// Smallest denominator of the inverse falloff
pub const MIN_FALLOFF_DENOMINATOR: f64 = 0.1;

/// Raw damage a zone deals at `distance_m` from its center.
///
/// Missing or non-finite distances deal no damage. The safe radius is
/// exclusive: at exactly `source_radius + safe_radius` damage is zero.
pub fn evaluate_zone_damage(distance_m: Option<f64>, profile: &DamageProfile) -> f64 {
    let Some(distance) = distance_m.filter(|d| d.is_finite()) else {
        return 0.0;
    };

    let effective_distance = (distance - profile.source_radius).max(0.0);
    if effective_distance >= profile.safe_radius {
        return 0.0;
    }

    let denominator = (effective_distance + profile.offset).max(MIN_FALLOFF_DENOMINATOR);
    let damage = profile.base_damage + profile.scale / denominator;

    match profile.max_damage {
        Some(cap) => damage.min(cap),
        None => damage,
    }
}

/// Damage left after the guard stat is subtracted
pub fn mitigate(raw_damage: f64, guard: f64) -> f64 {
    (raw_damage - guard).max(0.0)
}

/// Impact intensity understood by the haptic actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticStyle {
    Light,
    Medium,
    Heavy,
}

/// Discrete feedback tier derived from the current damage rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticStage {
    /// No haptics
    #[default]
    Calm,
    Light,
    Medium,
    Heavy,
}

impl HapticStage {
    /// Stage for a summed, mitigated damage value
    pub fn for_damage(total_damage: f64) -> Self {
        // NaN falls through every comparison and lands on Calm
        if total_damage >= 6.0 {
            Self::Heavy
        } else if total_damage >= 3.0 {
            Self::Medium
        } else if total_damage >= 1.0 {
            Self::Light
        } else {
            Self::Calm
        }
    }

    /// Numeric tier, 0 through 3
    pub fn level(self) -> u8 {
        match self {
            Self::Calm => 0,
            Self::Light => 1,
            Self::Medium => 2,
            Self::Heavy => 3,
        }
    }

    /// Minimum time between pulses while this stage is active
    pub fn interval_ms(self) -> Option<u64> {
        match self {
            Self::Calm => None,
            Self::Light => Some(3_000),
            Self::Medium => Some(2_000),
            Self::Heavy => Some(1_000),
        }
    }

    pub fn style(self) -> Option<HapticStyle> {
        match self {
            Self::Calm => None,
            Self::Light => Some(HapticStyle::Light),
            Self::Medium => Some(HapticStyle::Medium),
            Self::Heavy => Some(HapticStyle::Heavy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fountain() -> DamageProfile {
        DamageProfile {
            source_radius: 0.0,
            safe_radius: 60.0,
            base_damage: 6.0,
            scale: 30.0,
            offset: 0.1,
            max_damage: Some(18.0),
        }
    }

    #[test]
    fn test_fountain_scenario() {
        let zone = fountain();
        assert_eq!(evaluate_zone_damage(Some(0.0), &zone), 18.0);

        let at_30 = evaluate_zone_damage(Some(30.0), &zone);
        assert!((at_30 - (6.0 + 30.0 / 30.1)).abs() < 1e-9);
        assert!((at_30 - 6.997).abs() < 1e-3);

        assert_eq!(evaluate_zone_damage(Some(60.0), &zone), 0.0);
    }

    #[test]
    fn test_missing_or_garbage_distance_is_harmless() {
        let zone = fountain();
        assert_eq!(evaluate_zone_damage(None, &zone), 0.0);
        assert_eq!(evaluate_zone_damage(Some(f64::NAN), &zone), 0.0);
        assert_eq!(evaluate_zone_damage(Some(f64::INFINITY), &zone), 0.0);
    }

    #[test]
    fn test_zero_distance_uses_offset_or_floor() {
        let mut zone = DamageProfile {
            max_damage: None,
            ..fountain()
        };
        zone.offset = 2.0;
        assert_eq!(evaluate_zone_damage(Some(0.0), &zone), 6.0 + 30.0 / 2.0);

        zone.offset = 0.0;
        assert_eq!(evaluate_zone_damage(Some(0.0), &zone), 6.0 + 30.0 / 0.1);

        zone.offset = -4.0;
        assert_eq!(evaluate_zone_damage(Some(0.0), &zone), 6.0 + 30.0 / 0.1);
    }

    #[test]
    fn test_source_radius_counts_as_zero_distance() {
        let zone = DamageProfile {
            source_radius: 10.0,
            max_damage: None,
            ..fountain()
        };
        assert_eq!(
            evaluate_zone_damage(Some(4.0), &zone),
            evaluate_zone_damage(Some(10.0), &zone)
        );
        assert_eq!(evaluate_zone_damage(Some(70.0), &zone), 0.0);
        assert!(evaluate_zone_damage(Some(69.9), &zone) > 0.0);
    }

    #[test]
    fn test_edge_of_lethal_range_is_safe() {
        let arch = DamageProfile {
            source_radius: 10.0,
            safe_radius: 40.0,
            base_damage: 2.0,
            scale: 15.0,
            offset: 1.0,
            max_damage: None,
        };
        assert_eq!(evaluate_zone_damage(Some(50.0), &arch), 0.0);
        assert!(evaluate_zone_damage(Some(49.999), &arch) > 2.0);

        // integer radii sum exactly, so the property holds at the boundary itself
        for (source_radius, safe_radius) in [(0.0, 60.0), (5.0, 35.0), (25.0, 1.0)] {
            let profile = DamageProfile {
                source_radius,
                safe_radius,
                ..arch
            };
            let edge = source_radius + safe_radius;
            assert_eq!(evaluate_zone_damage(Some(edge), &profile), 0.0);
        }
    }

    #[test]
    fn test_mitigation_floors_at_zero() {
        assert_eq!(mitigate(5.0, 2.0), 3.0);
        assert_eq!(mitigate(1.0, 2.5), 0.0);
        assert_eq!(mitigate(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_haptic_stage_thresholds() {
        assert_eq!(HapticStage::for_damage(0.999), HapticStage::Calm);
        assert_eq!(HapticStage::for_damage(1.0), HapticStage::Light);
        assert_eq!(HapticStage::for_damage(2.99), HapticStage::Light);
        assert_eq!(HapticStage::for_damage(3.0), HapticStage::Medium);
        assert_eq!(HapticStage::for_damage(6.0), HapticStage::Heavy);
        assert_eq!(HapticStage::for_damage(f64::NAN), HapticStage::Calm);

        assert_eq!(HapticStage::Light.interval_ms(), Some(3_000));
        assert_eq!(HapticStage::Medium.interval_ms(), Some(2_000));
        assert_eq!(HapticStage::Heavy.interval_ms(), Some(1_000));
        assert_eq!(HapticStage::Heavy.style(), Some(HapticStyle::Heavy));
        assert_eq!(HapticStage::Calm.level(), 0);
        assert!(HapticStage::Medium > HapticStage::Light);
    }

    fn any_profile() -> impl Strategy<Value = DamageProfile> {
        (
            0.0..50.0f64,
            0.0..500.0f64,
            0.0..20.0f64,
            0.0..100.0f64,
            -5.0..5.0f64,
            proptest::option::of(0.0..50.0f64),
        )
            .prop_map(
                |(source_radius, safe_radius, base_damage, scale, offset, max_damage)| {
                    DamageProfile {
                        source_radius,
                        safe_radius,
                        base_damage,
                        scale,
                        offset,
                        max_damage,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn prop_zero_outside_lethal_range(profile in any_profile(), beyond in 0.001..10_000.0f64) {
            let distance = profile.source_radius + profile.safe_radius + beyond;
            prop_assert_eq!(evaluate_zone_damage(Some(distance), &profile), 0.0);
        }

        #[test]
        fn prop_never_exceeds_cap(profile in any_profile(), distance in 0.0..1_000.0f64) {
            let damage = evaluate_zone_damage(Some(distance), &profile);
            if let Some(cap) = profile.max_damage {
                prop_assert!(damage <= cap);
            }
        }

        #[test]
        fn prop_denominator_never_below_floor(profile in any_profile(), distance in 0.0..1_000.0f64) {
            let damage = evaluate_zone_damage(Some(distance), &profile);
            prop_assert!(damage <= profile.base_damage + profile.scale / MIN_FALLOFF_DENOMINATOR);
            prop_assert!(damage.is_finite());
        }
    }
}
