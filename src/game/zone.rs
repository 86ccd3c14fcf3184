//! Zone configuration: fixed hazards, the moving hazard and the healing zone
//!
//! Zones are process-wide constants loaded once at startup, either from the
//! built-in catalog or from JSON supplied through configuration.

use serde::{Deserialize, Serialize};

use super::geo::Coordinate;

/// Shape parameters of a hazard's damage falloff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageProfile {
    /// Radius of the damage source itself; distance inside it counts as zero
    pub source_radius: f64,
    /// Effective distance (beyond the source) at which damage stops
    pub safe_radius: f64,
    /// Flat damage added whenever inside the lethal range
    pub base_damage: f64,
    /// Numerator of the inverse falloff
    pub scale: f64,
    /// Added to the effective distance before dividing
    pub offset: f64,
    /// Optional cap on the result
    #[serde(default)]
    pub max_damage: Option<f64>,
}

/// A fixed-location source of continuous damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardZone {
    pub id: String,
    pub name: String,
    pub center: Coordinate,
    pub profile: DamageProfile,
}

/// An area that nullifies damage and grants regen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingZone {
    pub id: String,
    pub name: String,
    pub center: Coordinate,
    pub radius: f64,
}

impl HealingZone {
    /// Whether `distance_m` from the center is inside the zone (boundary inclusive)
    pub fn contains_distance(&self, distance_m: f64) -> bool {
        distance_m.is_finite() && distance_m <= self.radius
    }
}

/// Configuration of the hazard that wanders inside a bounding circle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingHazardConfig {
    /// Identity and damage shape; `zone.center` is the center of the bounding circle
    pub zone: HazardZone,
    /// Radius of the circle the hazard bounces inside, meters
    pub bounding_radius: f64,
    /// Travel speed, meters per second
    pub speed_mps: f64,
    /// Initial heading in degrees clockwise from north
    #[serde(default)]
    pub initial_heading_deg: f64,
}

/// Every zone a session plays against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCatalog {
    #[serde(default)]
    pub hazards: Vec<HazardZone>,
    #[serde(default)]
    pub moving_hazard: Option<MovingHazardConfig>,
    #[serde(default)]
    pub healing_zone: Option<HealingZone>,
}

impl ZoneCatalog {
    /// Parse a catalog from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Total number of damage sources (fixed plus moving)
    pub fn hazard_count(&self) -> usize {
        self.hazards.len() + usize::from(self.moving_hazard.is_some())
    }

    /// Built-in demo layout around Washington Square Park
    pub fn demo() -> Self {
        Self {
            hazards: vec![
                HazardZone {
                    id: "fountain".to_string(),
                    name: "Irradiated Fountain".to_string(),
                    center: Coordinate::new(40.730_823, -73.997_332),
                    profile: DamageProfile {
                        source_radius: 0.0,
                        safe_radius: 60.0,
                        base_damage: 6.0,
                        scale: 30.0,
                        offset: 0.1,
                        max_damage: Some(18.0),
                    },
                },
                HazardZone {
                    id: "arch".to_string(),
                    name: "Static Arch".to_string(),
                    center: Coordinate::new(40.731_150, -73.997_050),
                    profile: DamageProfile {
                        source_radius: 10.0,
                        safe_radius: 40.0,
                        base_damage: 2.0,
                        scale: 15.0,
                        offset: 1.0,
                        max_damage: Some(8.0),
                    },
                },
            ],
            moving_hazard: Some(MovingHazardConfig {
                zone: HazardZone {
                    id: "wanderer".to_string(),
                    name: "Wandering Storm".to_string(),
                    center: Coordinate::new(40.730_600, -73.997_700),
                    profile: DamageProfile {
                        source_radius: 5.0,
                        safe_radius: 35.0,
                        base_damage: 3.0,
                        scale: 20.0,
                        offset: 0.5,
                        max_damage: Some(12.0),
                    },
                },
                bounding_radius: 150.0,
                speed_mps: 1.4,
                initial_heading_deg: 45.0,
            }),
            healing_zone: Some(HealingZone {
                id: "library".to_string(),
                name: "Library Steps".to_string(),
                center: Coordinate::new(40.729_500, -73.997_100),
                radius: 25.0,
            }),
        }
    }
}

impl Default for ZoneCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_json() {
        let json = r#"{
            "hazards": [{
                "id": "pit",
                "name": "Pit",
                "center": { "latitude": 1.0, "longitude": 2.0 },
                "profile": {
                    "source_radius": 0.0,
                    "safe_radius": 60.0,
                    "base_damage": 6.0,
                    "scale": 30.0,
                    "offset": 0.1
                }
            }],
            "healing_zone": {
                "id": "camp",
                "name": "Camp",
                "center": { "latitude": 1.001, "longitude": 2.0 },
                "radius": 20.0
            }
        }"#;

        let catalog = ZoneCatalog::from_json(json).unwrap();
        assert_eq!(catalog.hazards.len(), 1);
        assert_eq!(catalog.hazards[0].profile.max_damage, None);
        assert!(catalog.moving_hazard.is_none());
        assert_eq!(catalog.hazard_count(), 1);
        assert_eq!(catalog.healing_zone.unwrap().radius, 20.0);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ZoneCatalog::from_json("{\"hazards\": 3}").is_err());
    }

    #[test]
    fn demo_catalog_round_trips_through_json() {
        let demo = ZoneCatalog::demo();
        let json = serde_json::to_string(&demo).unwrap();
        let parsed = ZoneCatalog::from_json(&json).unwrap();
        let ids: Vec<&str> = parsed.hazards.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, ["fountain", "arch"]);
        assert_eq!(parsed.hazards[0].profile.max_damage, Some(18.0));
        assert_eq!(parsed.moving_hazard.unwrap().bounding_radius, 150.0);
        assert_eq!(demo.hazard_count(), 3);
    }

    #[test]
    fn healing_boundary_is_inclusive() {
        let zone = ZoneCatalog::demo().healing_zone.unwrap();
        assert!(zone.contains_distance(25.0));
        assert!(!zone.contains_distance(25.01));
        assert!(!zone.contains_distance(f64::NAN));
    }
}
