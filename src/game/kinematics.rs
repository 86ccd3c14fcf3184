//! Moving-hazard kinematics
//!
//! The hazard is a particle bouncing elastically inside a disk centered on
//! the origin of its local frame (meters, x = east, y = north).

use glam::DVec2;

use super::geo::{offsets_to_coords, Coordinate};
use super::zone::{HazardZone, MovingHazardConfig};

/// Upper bound on boundary reflections handled in one call
pub const MAX_REFLECTIONS: usize = 4;

const TRAVEL_EPSILON: f64 = 1e-9;

/// Result of advancing a point inside a circle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleStep {
    pub position: DVec2,
    pub heading: DVec2,
}

/// Reflect `dir` about the surface with unit `normal`
#[inline]
pub fn reflect(dir: DVec2, normal: DVec2) -> DVec2 {
    dir - 2.0 * dir.dot(normal) * normal
}

/// Move `position` along `heading` for `distance` meters inside a circle of
/// `radius` around the origin, reflecting specularly off the boundary.
///
/// Non-finite or negative distances move nothing. If no forward
/// intersection with the boundary exists the point is clamped onto it.
pub fn advance_within_circle(
    position: DVec2,
    heading: DVec2,
    distance: f64,
    radius: f64,
) -> CircleStep {
    if !(radius > 0.0) || !radius.is_finite() {
        return CircleStep {
            position: DVec2::ZERO,
            heading,
        };
    }

    let mut pos = position;
    let Some(mut dir) = heading.try_normalize() else {
        return CircleStep {
            position: clamp_to_circle(pos, radius),
            heading,
        };
    };
    let mut remaining = if distance.is_finite() {
        distance.max(0.0)
    } else {
        0.0
    };

    for _ in 0..MAX_REFLECTIONS {
        if remaining <= TRAVEL_EPSILON {
            break;
        }

        let target = pos + dir * remaining;
        if target.length() <= radius {
            pos = target;
            break;
        }

        // Line-circle intersection: |pos + t*dir| = radius
        let pd = pos.dot(dir);
        let pp = pos.length_squared();
        let discriminant = pd * pd - (pp - radius * radius);
        if discriminant < 0.0 {
            pos = clamp_to_circle(pos, radius);
            break;
        }

        let travel = (-pd + discriminant.sqrt()).clamp(0.0, remaining);
        pos += dir * travel;
        remaining -= travel;

        let Some(normal) = pos.try_normalize() else {
            break;
        };
        dir = reflect(dir, normal).try_normalize().unwrap_or(-normal);
    }

    CircleStep {
        position: clamp_to_circle(pos, radius),
        heading: dir,
    }
}

fn clamp_to_circle(pos: DVec2, radius: f64) -> DVec2 {
    let length = pos.length();
    if !length.is_finite() {
        return DVec2::ZERO;
    }
    if length > radius {
        pos * (radius / length)
    } else {
        pos
    }
}

/// Unit heading for a compass bearing in degrees (0 = north, 90 = east)
pub fn heading_from_bearing(bearing_deg: f64) -> DVec2 {
    let theta = bearing_deg.to_radians();
    DVec2::new(theta.sin(), theta.cos())
}

/// Runtime state of the wandering hazard, owned by the session
#[derive(Debug, Clone)]
pub struct MovingHazard {
    config: MovingHazardConfig,
    offset: DVec2,
    heading: DVec2,
}

impl MovingHazard {
    pub fn new(config: MovingHazardConfig) -> Self {
        let heading = heading_from_bearing(config.initial_heading_deg);
        Self {
            config,
            offset: DVec2::ZERO,
            heading,
        }
    }

    pub fn zone(&self) -> &HazardZone {
        &self.config.zone
    }

    /// Advance by `dt_secs` of travel at the configured speed
    pub fn advance(&mut self, dt_secs: f64) {
        let step = advance_within_circle(
            self.offset,
            self.heading,
            self.config.speed_mps * dt_secs,
            self.config.bounding_radius,
        );
        self.offset = step.position;
        self.heading = step.heading;
    }

    /// Current geographic position of the hazard
    pub fn coordinate(&self) -> Coordinate {
        offsets_to_coords(self.config.zone.center, self.offset.x, self.offset.y)
    }
}
