//! Platform collaborators: location provider and haptic actuator
//!
//! The host app implements these against the OS. The process binary uses
//! the stand-ins in [`simulated`].

pub mod simulated;

use std::future::Future;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::game::{Coordinate, HapticStyle};

pub use simulated::{LogHaptics, SimulatedProvider, SimulationConfig};

/// Location permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Raw coordinates of a fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixCoords {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius, meters
    pub accuracy: Option<f64>,
}

/// A single location update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coords: FixCoords,
    /// Unix milliseconds at which the fix was taken
    pub timestamp_ms: u64,
}

impl LocationFix {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.coords.latitude, self.coords.longitude)
    }
}

/// Location provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Location updates stopped")]
    StreamClosed,
}

/// Haptic actuator errors (always swallowed by callers)
#[derive(Debug, thiserror::Error)]
pub enum HapticError {
    #[error("Haptics unavailable: {0}")]
    Unavailable(String),
}

/// Source of GPS fixes
pub trait LocationProvider: Send + Sync + 'static {
    /// Current permission without prompting
    fn permission_status(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// Prompt for permission
    fn request_permission(&self) -> impl Future<Output = PermissionStatus> + Send;

    /// One-shot position request
    fn current_position(
        &self,
    ) -> impl Future<Output = Result<LocationFix, ProviderError>> + Send;

    /// Push subscription of fixes. The stream ends when tracking is
    /// interrupted; dropping it unsubscribes.
    fn subscribe(&self) -> Result<BoxStream<'static, LocationFix>, ProviderError>;
}

/// Fire-and-forget impact feedback
pub trait HapticActuator: Send + Sync + 'static {
    fn impact(&self, style: HapticStyle) -> Result<(), HapticError>;
}
