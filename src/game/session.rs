//! Session state and the per-second survival tick
//!
//! A [`Session`] owns every piece of mutable game state: player stats, the
//! moving hazard, the position filter, haptic cadence and the last known
//! coordinate. Fixes and ticks both funnel into [`Session::evaluate`].

use tracing::{debug, info};
use uuid::Uuid;

use crate::util::time::{clamp_tick_delta, round2};

use super::damage::{evaluate_zone_damage, mitigate, HapticStage};
use super::filter::{GateDecision, PositionFilter};
use super::geo::{calculate_distance_meters, Coordinate};
use super::kinematics::MovingHazard;
use super::player::PlayerStats;
use super::snapshot::{HudSnapshot, SessionEvent, TrackingStatus, ZoneSummary};
use super::zone::{HazardZone, HealingZone, ZoneCatalog};

/// HP regained per second anywhere while 0 < hp < max
pub const PASSIVE_REGEN_PER_SEC: f64 = 1.0;
/// HP regained per second inside the healing zone
pub const HEALING_REGEN_PER_SEC: f64 = 3.0;
/// Time spent at 0 HP inside the healing zone before regen resumes
pub const REVIVE_DWELL_SECS: f64 = 60.0;

/// Haptic pacing state, persisted across ticks to gate re-firing
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HapticCadence {
    pub stage: HapticStage,
    pub last_fired_ms: Option<u64>,
}

impl HapticCadence {
    /// Whether the active stage's interval has elapsed since the last pulse
    pub fn is_due(&self, now_ms: u64) -> bool {
        let Some(interval) = self.stage.interval_ms() else {
            return false;
        };
        match self.last_fired_ms {
            Some(last) => now_ms.saturating_sub(last) >= interval,
            None => true,
        }
    }

    fn fire(&mut self, now_ms: u64) -> Option<SessionEvent> {
        let style = self.stage.style()?;
        self.last_fired_ms = Some(now_ms);
        Some(SessionEvent::HapticPulse {
            stage: self.stage,
            style,
        })
    }
}

/// One player's survival session
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    hazards: Vec<HazardZone>,
    healing_zone: Option<HealingZone>,
    moving_hazard: Option<MovingHazard>,
    stats: PlayerStats,
    filter: Option<PositionFilter>,

    raw_coordinate: Option<Coordinate>,
    last_known: Option<Coordinate>,
    deviation_m: Option<f64>,

    summaries: Vec<ZoneSummary>,
    in_healing_zone: bool,
    dwell_secs: f64,
    last_applied_damage: f64,
    cadence: HapticCadence,
}

impl Session {
    /// Create a session. `smoothing` enables the position filter.
    pub fn new(catalog: ZoneCatalog, stats: PlayerStats, smoothing: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            hazards: catalog.hazards,
            healing_zone: catalog.healing_zone,
            moving_hazard: catalog.moving_hazard.map(MovingHazard::new),
            stats,
            filter: smoothing.then(PositionFilter::new),
            raw_coordinate: None,
            last_known: None,
            deviation_m: None,
            summaries: Vec::new(),
            in_healing_zone: false,
            dwell_secs: 0.0,
            last_applied_damage: 0.0,
            cadence: HapticCadence::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle a fresh location fix taken at `fix_timestamp_ms`
    pub fn on_fix(
        &mut self,
        coordinate: Coordinate,
        fix_timestamp_ms: u64,
        now_ms: u64,
    ) -> Vec<SessionEvent> {
        if !coordinate.is_finite() {
            debug!(session_id = %self.id, ?coordinate, "Dropping non-finite fix");
            return vec![SessionEvent::FixRejected {
                reason: "non-finite coordinate".to_string(),
            }];
        }

        self.raw_coordinate = Some(coordinate);

        let stabilized = match self.filter.as_mut() {
            Some(filter) => match filter.update(coordinate, fix_timestamp_ms) {
                Some(filtered) => {
                    match filtered.decision {
                        GateDecision::TooFast { speed_mps } => {
                            debug!(session_id = %self.id, speed_mps, "Implausible fix, dead-reckoning");
                        }
                        GateDecision::Jitter { moved_m } => {
                            debug!(session_id = %self.id, moved_m, "Fix within noise floor");
                        }
                        GateDecision::Accepted | GateDecision::Invalid => {}
                    }
                    self.deviation_m = Some(filtered.deviation_m);
                    filtered.coordinate
                }
                None => coordinate,
            },
            None => coordinate,
        };

        self.last_known = Some(stabilized);
        self.evaluate(stabilized, now_ms)
    }

    /// Advance the session by `dt_secs` of wall-clock time
    pub fn tick(&mut self, dt_secs: f64, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let dt = clamp_tick_delta(dt_secs);
        let was_down = self.stats.is_down();

        if let Some(hazard) = self.moving_hazard.as_mut() {
            hazard.advance(dt);
        }

        if !self.stats.is_down() && !self.stats.is_full() {
            self.stats.heal(PASSIVE_REGEN_PER_SEC * dt);
        }

        self.apply_healing_zone_regen(dt);

        if was_down && !self.stats.is_down() {
            info!(session_id = %self.id, hp = self.stats.hp, "Player revived");
            events.push(SessionEvent::Revived { hp: self.stats.hp });
        }

        if self.cadence.is_due(now_ms) {
            if let Some(pulse) = self.cadence.fire(now_ms) {
                events.push(pulse);
            }
        }

        if let Some(coordinate) = self.last_known {
            events.extend(self.evaluate(coordinate, now_ms));
        }

        debug!(
            session_id = %self.id,
            dt,
            hp = self.stats.hp,
            damage = self.last_applied_damage,
            stage = self.cadence.stage.level(),
            dwell = self.dwell_secs,
            "Tick"
        );

        events
    }

    fn apply_healing_zone_regen(&mut self, dt: f64) {
        let inside = match (self.last_known, self.healing_zone.as_ref()) {
            (Some(coordinate), Some(zone)) => {
                zone.contains_distance(calculate_distance_meters(coordinate, zone.center))
            }
            _ => false,
        };

        if !inside {
            self.dwell_secs = 0.0;
            return;
        }

        if self.stats.is_down() {
            self.dwell_secs = (self.dwell_secs + dt).min(REVIVE_DWELL_SECS);
        } else {
            self.dwell_secs = 0.0;
        }

        if !self.stats.is_down() || self.dwell_secs >= REVIVE_DWELL_SECS {
            self.stats.heal(HEALING_REGEN_PER_SEC * dt);
        }
    }

    /// Score every zone against `coordinate` and apply the summed damage.
    ///
    /// Shared by the fix path and the tick path; state at call time is the
    /// single source of truth.
    pub fn evaluate(&mut self, coordinate: Coordinate, now_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let in_healing = self.healing_zone.as_ref().is_some_and(|zone| {
            zone.contains_distance(calculate_distance_meters(coordinate, zone.center))
        });
        if in_healing != self.in_healing_zone {
            if in_healing {
                info!(session_id = %self.id, "Entered healing zone");
                events.push(SessionEvent::EnteredHealingZone);
            } else {
                info!(session_id = %self.id, "Left healing zone");
                events.push(SessionEvent::LeftHealingZone);
            }
        }
        self.in_healing_zone = in_healing;
        if !in_healing {
            self.dwell_secs = 0.0;
        }

        let guard = self.stats.guard;
        let moving = self
            .moving_hazard
            .as_ref()
            .map(|hazard| (hazard.zone(), hazard.coordinate()));
        let zones = self
            .hazards
            .iter()
            .map(|zone| (zone, zone.center, false))
            .chain(moving.map(|(zone, center)| (zone, center, true)));

        let summaries: Vec<ZoneSummary> = zones
            .map(|(zone, center, is_dynamic)| {
                let distance_m = calculate_distance_meters(coordinate, center);
                let raw_damage = if in_healing {
                    0.0
                } else {
                    evaluate_zone_damage(Some(distance_m), &zone.profile)
                };
                ZoneSummary {
                    zone_id: zone.id.clone(),
                    name: zone.name.clone(),
                    distance_m,
                    raw_damage,
                    mitigated_damage: mitigate(raw_damage, guard),
                    max_damage: zone.profile.max_damage,
                    is_dynamic,
                }
            })
            .collect();

        let total = round2(summaries.iter().map(|s| s.mitigated_damage).sum());
        self.summaries = summaries;

        let was_down = self.stats.is_down();
        self.stats.apply_damage(total);
        self.last_applied_damage = total;
        if !was_down && self.stats.is_down() {
            info!(session_id = %self.id, damage = total, "Player downed");
            events.push(SessionEvent::Downed);
        }

        let stage = HapticStage::for_damage(total);
        let escalated = stage > self.cadence.stage;
        self.cadence.stage = stage;
        if escalated {
            if let Some(pulse) = self.cadence.fire(now_ms) {
                events.push(pulse);
            }
        }

        events
    }

    /// Tracking was interrupted (permission loss, stop, restart)
    pub fn on_tracking_lost(&mut self) {
        if let Some(filter) = self.filter.as_mut() {
            filter.reset();
        }
        self.raw_coordinate = None;
        self.last_known = None;
        self.deviation_m = None;
        self.summaries.clear();
        self.in_healing_zone = false;
        self.dwell_secs = 0.0;
        self.last_applied_damage = 0.0;
        self.cadence = HapticCadence::default();
        info!(session_id = %self.id, hp = self.stats.hp, "Tracking state reset");
    }

    /// Build the read-only view for the HUD
    pub fn hud(&self, status: TrackingStatus) -> HudSnapshot {
        HudSnapshot {
            session_id: self.id,
            status_message: status.user_message(),
            status,
            stats: self.stats,
            zones: self.summaries.clone(),
            in_healing_zone: self.in_healing_zone,
            healing_dwell_secs: self.dwell_secs,
            last_applied_damage: self.last_applied_damage,
            haptic_stage: self.cadence.stage,
            raw_coordinate: self.raw_coordinate,
            stabilized_coordinate: self.last_known,
            deviation_m: self.deviation_m,
            moving_hazard_coordinate: self.moving_hazard.as_ref().map(MovingHazard::coordinate),
        }
    }
}
