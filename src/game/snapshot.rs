//! Read-only projections handed to the rendering layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::damage::{HapticStage, HapticStyle};
use super::geo::Coordinate;
use super::player::PlayerStats;

/// Per-zone result of the latest proximity evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone_id: String,
    pub name: String,
    /// Haversine distance from the evaluated coordinate, meters
    pub distance_m: f64,
    pub raw_damage: f64,
    pub mitigated_damage: f64,
    pub max_damage: Option<f64>,
    /// True for the moving hazard
    pub is_dynamic: bool,
}

/// Permission / location / error state of tracking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum TrackingStatus {
    /// Not started yet, or stopped
    Idle,
    /// Waiting on permission or the first fix
    Acquiring,
    /// Fixes are flowing and the tick is running
    Active,
    /// The user denied location access; a manual retry is offered
    PermissionDenied,
    /// The first fix or the update stream failed
    LocationUnavailable(String),
}

impl TrackingStatus {
    /// Text shown to the user for this state, if any
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::PermissionDenied => {
                Some("Location permission is required to play. Tap retry once granted.".to_string())
            }
            Self::LocationUnavailable(reason) => Some(format!("Unable to get location: {reason}")),
            _ => None,
        }
    }
}

/// Things that happened during one session update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Ask the actuator for an impact pulse
    HapticPulse {
        stage: HapticStage,
        style: HapticStyle,
    },
    /// HP reached zero
    Downed,
    /// HP left zero
    Revived { hp: f64 },
    EnteredHealingZone,
    LeftHealingZone,
    /// A fix was dropped before evaluation
    FixRejected { reason: String },
}

/// Everything the HUD reads on a render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub session_id: Uuid,
    pub status: TrackingStatus,
    pub status_message: Option<String>,
    pub stats: PlayerStats,
    pub zones: Vec<ZoneSummary>,
    pub in_healing_zone: bool,
    /// Dwell time accumulated at 0 HP inside the healing zone
    pub healing_dwell_secs: f64,
    /// Summed mitigated damage of the latest evaluation
    pub last_applied_damage: f64,
    pub haptic_stage: HapticStage,
    pub raw_coordinate: Option<Coordinate>,
    /// Coordinate actually used for scoring (smoothed when the filter is on)
    pub stabilized_coordinate: Option<Coordinate>,
    /// Distance between the stabilized and raw coordinates
    pub deviation_m: Option<f64>,
    pub moving_hazard_coordinate: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_tag() {
        let json = serde_json::to_value(TrackingStatus::LocationUnavailable("timeout".into())).unwrap();
        assert_eq!(json["state"], "location_unavailable");
        assert_eq!(json["message"], "timeout");

        let json = serde_json::to_value(TrackingStatus::Active).unwrap();
        assert_eq!(json["state"], "active");
    }

    #[test]
    fn status_messages() {
        assert!(TrackingStatus::Active.user_message().is_none());
        assert!(TrackingStatus::PermissionDenied.user_message().is_some());
        assert_eq!(
            TrackingStatus::LocationUnavailable("gps off".into()).user_message(),
            Some("Unable to get location: gps off".to_string())
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(SessionEvent::HapticPulse {
            stage: HapticStage::Heavy,
            style: HapticStyle::Heavy,
        })
        .unwrap();
        assert_eq!(json["event_type"], "haptic_pulse");
        assert_eq!(json["stage"], "heavy");
    }
}
