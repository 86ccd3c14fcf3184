//! Geographic math: local planar offsets and great-circle distance
//!
//! Offsets use the equirectangular approximation and are only valid for
//! distances small relative to the Earth's radius (hazard radii of a few
//! hundred meters). Damage decisions always use [`calculate_distance_meters`].

use geo::{Distance, HaversineMeasure, Point};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Meters per degree of latitude
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Mean Earth radius used by the haversine distance
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Convert a local offset in meters (x = east, y = north) around `center`
/// into a coordinate
pub fn offsets_to_coords(center: Coordinate, dx: f64, dy: f64) -> Coordinate {
    let delta_lat = dy / METERS_PER_DEGREE_LAT;
    let delta_lon = dx / (center.latitude.to_radians().cos() * METERS_PER_DEGREE_LAT);
    Coordinate {
        latitude: center.latitude + delta_lat,
        longitude: center.longitude + delta_lon,
    }
}

/// Inverse of [`offsets_to_coords`]
pub fn coords_to_offsets(center: Coordinate, coords: Coordinate) -> DVec2 {
    let dy = (coords.latitude - center.latitude) * METERS_PER_DEGREE_LAT;
    let dx = (coords.longitude - center.longitude)
        * center.latitude.to_radians().cos()
        * METERS_PER_DEGREE_LAT;
    DVec2::new(dx, dy)
}

impl From<Coordinate> for Point {
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.longitude, coordinate.latitude)
    }
}

/// Haversine great-circle distance in meters
pub fn calculate_distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_M).distance(Point::from(a), Point::from(b))
}
