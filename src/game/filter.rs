//! Position smoothing for noisy GPS fixes
//!
//! Two alpha-beta trackers (one per planar axis) run on local offsets from a
//! reference coordinate, the first fix since the last reset. A measurement
//! gate drops implausible jumps, sub-noise jitter re-measures the last
//! accepted position, and an exponential moving average damps what is left.

use glam::DVec2;

use super::geo::{calculate_distance_meters, coords_to_offsets, offsets_to_coords, Coordinate};

/// Position correction gain
pub const ALPHA: f64 = 0.5;
/// Velocity correction gain
pub const BETA: f64 = 0.15;
/// Weight of the newest sample in the output moving average
pub const EMA_ALPHA: f64 = 0.35;

/// Fastest plausible movement between accepted fixes
pub const MAX_PLAUSIBLE_SPEED_MPS: f64 = 5.5;
/// Movement below this is treated as sensor noise
pub const MIN_MOVEMENT_M: f64 = 0.75;

pub const MIN_DT_SECS: f64 = 0.05;
pub const MAX_DT_SECS: f64 = 3.0;
const DEFAULT_DT_SECS: f64 = 1.0;

/// Clamp a time step; non-finite or non-positive steps count as one second
pub fn sanitize_dt(dt_secs: f64) -> f64 {
    if !dt_secs.is_finite() || dt_secs <= 0.0 {
        return DEFAULT_DT_SECS;
    }
    dt_secs.clamp(MIN_DT_SECS, MAX_DT_SECS)
}

/// One-dimensional alpha-beta estimator
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlphaBetaAxis {
    pub position: f64,
    pub velocity: f64,
    pub initialized: bool,
}

impl AlphaBetaAxis {
    /// Advance by `dt_secs`, correcting with `measurement` when one was accepted.
    /// Without a measurement the prediction is taken as-is.
    pub fn step(&mut self, measurement: Option<f64>, dt_secs: f64) -> f64 {
        let measurement = measurement.filter(|m| m.is_finite());

        if !self.initialized {
            if let Some(m) = measurement {
                self.position = m;
                self.velocity = 0.0;
                self.initialized = true;
            }
            return self.position;
        }

        let dt = sanitize_dt(dt_secs);
        let predicted = self.position + self.velocity * dt;

        match measurement {
            None => {
                self.position = predicted;
            }
            Some(m) => {
                let residual = m - predicted;
                self.position = predicted + ALPHA * residual;
                self.velocity += (BETA / dt) * residual;
            }
        }

        self.position
    }

}

/// Why a fix was not fed to the trackers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accepted,
    /// Implied speed from the last accepted fix was too high
    TooFast { speed_mps: f64 },
    /// Movement from the last accepted fix was below the noise floor
    Jitter { moved_m: f64 },
    /// The fix itself was not finite
    Invalid,
}

/// Output of one filter update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredFix {
    pub coordinate: Coordinate,
    /// Distance between the stabilized output and the raw fix
    pub deviation_m: f64,
    pub decision: GateDecision,
}

/// Alpha-beta + EMA position stabilizer
#[derive(Debug, Clone, Default)]
pub struct PositionFilter {
    x: AlphaBetaAxis,
    y: AlphaBetaAxis,
    reference: Option<Coordinate>,
    ema: Option<DVec2>,
    last_stable: Option<Coordinate>,
    last_stable_ms: Option<u64>,
    last_timestamp_ms: Option<u64>,
}

impl PositionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; the next fix becomes the new reference
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed a raw fix taken at `timestamp_ms` and get the stabilized coordinate.
    ///
    /// Returns `None` only when the fix is not finite and no reference exists
    /// yet to dead-reckon from.
    pub fn update(&mut self, raw: Coordinate, timestamp_ms: u64) -> Option<FilteredFix> {
        let dt = match self.last_timestamp_ms {
            Some(last) if timestamp_ms > last => sanitize_dt((timestamp_ms - last) as f64 / 1000.0),
            _ => DEFAULT_DT_SECS,
        };
        self.last_timestamp_ms = Some(timestamp_ms);

        if self.reference.is_none() {
            if !raw.is_finite() {
                return None;
            }
            self.reference = Some(raw);
        }
        let reference = self.reference?;

        let decision = self.gate(raw, timestamp_ms);
        let measurement = match decision {
            GateDecision::Accepted => {
                self.last_stable = Some(raw);
                self.last_stable_ms = Some(timestamp_ms);
                Some(coords_to_offsets(reference, raw))
            }
            // Standing still: hold the trackers at the last accepted position
            GateDecision::Jitter { .. } => self
                .last_stable
                .map(|stable| coords_to_offsets(reference, stable)),
            GateDecision::TooFast { .. } | GateDecision::Invalid => None,
        };

        let filtered = DVec2::new(
            self.x.step(measurement.map(|m| m.x), dt),
            self.y.step(measurement.map(|m| m.y), dt),
        );

        let smoothed = match self.ema {
            Some(previous) => previous + (filtered - previous) * EMA_ALPHA,
            None => filtered,
        };
        self.ema = Some(smoothed);

        let coordinate = offsets_to_coords(reference, smoothed.x, smoothed.y);
        let deviation_m = if raw.is_finite() {
            calculate_distance_meters(coordinate, raw)
        } else {
            0.0
        };

        Some(FilteredFix {
            coordinate,
            deviation_m,
            decision,
        })
    }

    fn gate(&self, raw: Coordinate, timestamp_ms: u64) -> GateDecision {
        if !raw.is_finite() {
            return GateDecision::Invalid;
        }

        let (Some(last), Some(last_ms)) = (self.last_stable, self.last_stable_ms) else {
            return GateDecision::Accepted;
        };

        let moved_m = calculate_distance_meters(last, raw);
        let elapsed_secs = timestamp_ms.saturating_sub(last_ms) as f64 / 1000.0;
        classify_movement(moved_m, elapsed_secs)
    }
}

/// Gate a movement of `moved_m` over the real time since the last accepted
/// fix. Elapsed time is floored at `MIN_DT_SECS` but never capped.
fn classify_movement(moved_m: f64, elapsed_secs: f64) -> GateDecision {
    if !moved_m.is_finite() {
        return GateDecision::Invalid;
    }
    let elapsed = if elapsed_secs.is_finite() {
        elapsed_secs.max(MIN_DT_SECS)
    } else {
        MIN_DT_SECS
    };
    let speed_mps = moved_m / elapsed;

    if speed_mps > MAX_PLAUSIBLE_SPEED_MPS {
        GateDecision::TooFast { speed_mps }
    } else if moved_m >= MIN_MOVEMENT_M {
        GateDecision::Accepted
    } else {
        GateDecision::Jitter { moved_m }
    }
}
