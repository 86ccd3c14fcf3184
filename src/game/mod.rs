//! Survival game core
//!
//! Pure, synchronous game logic. Timing and I/O live in `tracking` and
//! `platform`; everything here takes explicit timestamps.

pub mod damage;
pub mod filter;
pub mod geo;
pub mod kinematics;
pub mod player;
pub mod session;
pub mod snapshot;
pub mod zone;

pub use damage::HapticStyle;
pub use geo::Coordinate;
pub use player::PlayerStats;
pub use session::Session;
pub use snapshot::{HudSnapshot, SessionEvent, TrackingStatus};
pub use zone::ZoneCatalog;
