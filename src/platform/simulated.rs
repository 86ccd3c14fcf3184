//! Simulated platform: a seeded random walker and logging haptics

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use glam::DVec2;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::game::geo::offsets_to_coords;
use crate::game::kinematics::{advance_within_circle, heading_from_bearing};
use crate::game::{Coordinate, HapticStyle};
use crate::util::time::unix_millis;

use super::{
    FixCoords, HapticActuator, HapticError, LocationFix, LocationProvider, PermissionStatus,
    ProviderError,
};

/// Size of an occasional multipath spike, meters
const SPIKE_METERS: f64 = 40.0;
/// Largest random heading change per fix, radians
const MAX_TURN_RAD: f64 = 0.6;

/// Parameters of the simulated walk
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Center of the area the walker roams
    pub start: Coordinate,
    pub roam_radius_m: f64,
    pub walking_speed_mps: f64,
    pub fix_interval: Duration,
    /// Uniform jitter added to each axis, meters
    pub noise_m: f64,
    /// Chance per fix of a large GPS spike
    pub spike_probability: f64,
    pub permission: PermissionStatus,
    /// Whether the simulated device can deliver haptic pulses
    pub haptics: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start: Coordinate::new(40.730_823, -73.997_332),
            roam_radius_m: 180.0,
            walking_speed_mps: 1.4,
            fix_interval: Duration::from_millis(1_000),
            noise_m: 3.0,
            spike_probability: 0.03,
            permission: PermissionStatus::Granted,
            haptics: true,
        }
    }
}

#[derive(Debug)]
struct Walker {
    origin: Coordinate,
    offset: DVec2,
    heading: DVec2,
    rng: ChaCha8Rng,
    step_m: f64,
    roam_radius_m: f64,
    noise_m: f64,
    spike_probability: f64,
}

impl Walker {
    fn new(config: &SimulationConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let heading = heading_from_bearing(rng.gen_range(0.0..360.0));
        Self {
            origin: config.start,
            offset: DVec2::ZERO,
            heading,
            rng,
            step_m: config.walking_speed_mps.max(0.0) * config.fix_interval.as_secs_f64(),
            roam_radius_m: config.roam_radius_m,
            noise_m: config.noise_m.abs(),
            spike_probability: config.spike_probability.clamp(0.0, 1.0),
        }
    }

    fn next_fix(&mut self, timestamp_ms: u64) -> LocationFix {
        let turn = self.rng.gen_range(-MAX_TURN_RAD..=MAX_TURN_RAD);
        let heading = DVec2::from_angle(turn).rotate(self.heading);
        let step = advance_within_circle(self.offset, heading, self.step_m, self.roam_radius_m);
        self.offset = step.position;
        self.heading = step.heading;

        let mut error = DVec2::new(
            self.rng.gen_range(-self.noise_m..=self.noise_m),
            self.rng.gen_range(-self.noise_m..=self.noise_m),
        );
        if self.rng.gen_bool(self.spike_probability) {
            let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
            error += DVec2::from_angle(angle) * SPIKE_METERS;
        }

        let observed = self.offset + error;
        let coordinate = offsets_to_coords(self.origin, observed.x, observed.y);
        LocationFix {
            coords: FixCoords {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
                altitude: Some(10.0),
                accuracy: Some(self.noise_m.max(1.0) * 1.5),
            },
            timestamp_ms,
        }
    }
}

/// Location provider that walks randomly around a start point
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    walker: Arc<Mutex<Walker>>,
    granted: Arc<AtomicBool>,
    fix_interval: Duration,
}

impl SimulatedProvider {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            walker: Arc::new(Mutex::new(Walker::new(&config))),
            granted: Arc::new(AtomicBool::new(config.permission == PermissionStatus::Granted)),
            fix_interval: config.fix_interval,
        }
    }

    /// Simulate the user changing permission in system settings.
    /// Revoking ends any live subscription at its next fix.
    pub fn set_permission(&self, status: PermissionStatus) {
        self.granted
            .store(status == PermissionStatus::Granted, Ordering::SeqCst);
    }

    fn status(&self) -> PermissionStatus {
        if self.granted.load(Ordering::SeqCst) {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    }
}

impl LocationProvider for SimulatedProvider {
    async fn permission_status(&self) -> PermissionStatus {
        self.status()
    }

    async fn request_permission(&self) -> PermissionStatus {
        // the simulated user answers with whatever settings say
        self.status()
    }

    async fn current_position(&self) -> Result<LocationFix, ProviderError> {
        if self.status() == PermissionStatus::Denied {
            return Err(ProviderError::PermissionDenied);
        }
        Ok(self.walker.lock().next_fix(unix_millis()))
    }

    fn subscribe(&self) -> Result<BoxStream<'static, LocationFix>, ProviderError> {
        if self.status() == PermissionStatus::Denied {
            return Err(ProviderError::PermissionDenied);
        }

        let walker = Arc::clone(&self.walker);
        let granted = Arc::clone(&self.granted);
        let interval = self.fix_interval;

        let fixes = stream::unfold((), move |()| {
            let walker = Arc::clone(&walker);
            let granted = Arc::clone(&granted);
            async move {
                tokio::time::sleep(interval).await;
                if !granted.load(Ordering::SeqCst) {
                    debug!("Simulated permission revoked, ending fix stream");
                    return None;
                }
                let fix = walker.lock().next_fix(unix_millis());
                Some((fix, ()))
            }
        });

        Ok(fixes.boxed())
    }
}

/// Haptic actuator that only logs
#[derive(Debug)]
pub struct LogHaptics {
    pulses: AtomicU64,
    available: bool,
}

impl LogHaptics {
    pub fn new() -> Self {
        Self {
            pulses: AtomicU64::new(0),
            available: true,
        }
    }

    /// A device without a haptic motor; every pulse fails
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Pulses delivered so far
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::Relaxed)
    }
}

impl HapticActuator for LogHaptics {
    fn impact(&self, style: HapticStyle) -> Result<(), HapticError> {
        if !self.available {
            return Err(HapticError::Unavailable("simulated device has no motor".to_string()));
        }
        self.pulses.fetch_add(1, Ordering::Relaxed);
        debug!(?style, "Haptic impact");
        Ok(())
    }
}

impl<T: HapticActuator> HapticActuator for Arc<T> {
    fn impact(&self, style: HapticStyle) -> Result<(), HapticError> {
        (**self).impact(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::geo::calculate_distance_meters;

    fn quick_config() -> SimulationConfig {
        SimulationConfig {
            fix_interval: Duration::from_millis(1),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_permission_reporting() {
        let provider = SimulatedProvider::new(SimulationConfig {
            permission: PermissionStatus::Denied,
            ..quick_config()
        });
        assert_eq!(
            tokio_test::block_on(provider.permission_status()),
            PermissionStatus::Denied
        );
        assert!(matches!(
            tokio_test::block_on(provider.current_position()),
            Err(ProviderError::PermissionDenied)
        ));
        assert!(provider.subscribe().is_err());

        provider.set_permission(PermissionStatus::Granted);
        assert_eq!(
            tokio_test::block_on(provider.request_permission()),
            PermissionStatus::Granted
        );
        assert!(tokio_test::block_on(provider.current_position()).is_ok());
    }

    #[test]
    fn test_walk_is_deterministic_per_seed() {
        let a = SimulatedProvider::new(quick_config());
        let b = SimulatedProvider::new(quick_config());
        for _ in 0..20 {
            let fa = a.walker.lock().next_fix(0);
            let fb = b.walker.lock().next_fix(0);
            assert_eq!(fa, fb);
        }
    }

    #[test]
    fn test_walk_stays_near_start() {
        let config = quick_config();
        let start = config.start;
        let bound = config.roam_radius_m + config.noise_m * 2.0 + SPIKE_METERS;
        let provider = SimulatedProvider::new(config);
        for _ in 0..2_000 {
            let fix = provider.walker.lock().next_fix(0);
            assert!(calculate_distance_meters(start, fix.coordinate()) <= bound);
        }
    }

    #[tokio::test]
    async fn test_stream_ends_when_permission_revoked() {
        let provider = SimulatedProvider::new(quick_config());
        let mut fixes = provider.subscribe().unwrap();

        assert!(fixes.next().await.is_some());
        assert!(fixes.next().await.is_some());

        provider.set_permission(PermissionStatus::Denied);
        assert!(fixes.next().await.is_none());
    }

    #[test]
    fn test_log_haptics_counts() {
        let haptics = Arc::new(LogHaptics::new());
        haptics.impact(HapticStyle::Light).unwrap();
        haptics.impact(HapticStyle::Heavy).unwrap();
        assert_eq!(haptics.pulses(), 2);
    }

    #[test]
    fn test_unavailable_haptics_fail_without_counting() {
        let haptics = LogHaptics::unavailable();
        assert!(matches!(
            haptics.impact(HapticStyle::Medium),
            Err(HapticError::Unavailable(_))
        ));
        assert_eq!(haptics.pulses(), 0);
    }
}
