//! Time utilities for the session tick

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Tick rate configuration
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000; // 1 Hz

/// Longest elapsed time a single tick may account for (absorbs stalls)
pub const MAX_TICK_DELTA_SECS: f64 = 2.0;

/// Clamp a measured tick delta into `[0, MAX_TICK_DELTA_SECS]`.
/// Non-finite deltas count as no elapsed time.
pub fn clamp_tick_delta(dt_secs: f64) -> f64 {
    if !dt_secs.is_finite() {
        return 0.0;
    }
    dt_secs.clamp(0.0, MAX_TICK_DELTA_SECS)
}

/// Round to two decimal places (all HP mutations are stored this way)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
