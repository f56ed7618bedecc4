//! Spherical-earth geodesy helpers.
//!
//! Distances are great-circle distances in meters on a sphere with the WGS84
//! equatorial radius, which matches what common web mapping libraries use
//! for their "spherical" geometry helpers.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Sphere radius used for all distance and offset computations (meters).
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite and inside the valid lat/lng ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Location) -> f64 {
        distance_meters(self, other)
    }

    /// True when both axes differ by less than `tolerance_deg`.
    pub fn approx_eq(&self, other: &Location, tolerance_deg: f64) -> bool {
        (self.lat - other.lat).abs() < tolerance_deg && (self.lng - other.lng).abs() < tolerance_deg
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Great-circle distance between two positions using the haversine formula.
pub fn distance_meters(from: &Location, to: &Location) -> f64 {
    let lat1 = from.lat * DEG_TO_RAD;
    let lat2 = to.lat * DEG_TO_RAD;
    let dlat = (to.lat - from.lat) * DEG_TO_RAD;
    let dlng = (to.lng - from.lng) * DEG_TO_RAD;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Initial great-circle bearing from `from` to `to`, in degrees within `[0, 360)`.
pub fn bearing_degrees(from: &Location, to: &Location) -> f64 {
    let lat1 = from.lat * DEG_TO_RAD;
    let lat2 = to.lat * DEG_TO_RAD;
    let dlng = (to.lng - from.lng) * DEG_TO_RAD;

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    (y.atan2(x) * RAD_TO_DEG).rem_euclid(360.0)
}

/// Project `start` along `heading_deg` for `distance_m` meters.
///
/// Longitude of the result is normalized to `[-180, 180]`.
pub fn offset(start: &Location, distance_m: f64, heading_deg: f64) -> Location {
    let lat1 = start.lat * DEG_TO_RAD;
    let lng1 = start.lng * DEG_TO_RAD;
    let heading = heading_deg * DEG_TO_RAD;
    let angular = distance_m / EARTH_RADIUS_METERS;

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_d, cos_d) = angular.sin_cos();

    let lat2 = (sin_lat1 * cos_d + cos_lat1 * sin_d * heading.cos()).asin();
    let lng2 = lng1 + (heading.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2.sin());

    let mut lng = lng2 * RAD_TO_DEG;
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }

    Location::new(lat2 * RAD_TO_DEG, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_points_is_zero() {
        let p = Location::new(13.0, 77.6);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(0.0, 1.0);
        let expected = EARTH_RADIUS_METERS * DEG_TO_RAD;
        assert!((distance_meters(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn cardinal_bearings() {
        let origin = Location::new(0.0, 0.0);
        assert!((bearing_degrees(&origin, &Location::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &Location::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &Location::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &Location::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn offset_then_measure_matches_distance_and_bearing() {
        let start = Location::new(13.013251, 77.624151);
        let moved = offset(&start, 2_500.0, 37.0);

        assert!((distance_meters(&start, &moved) - 2_500.0).abs() < 1e-6);
        assert!((bearing_degrees(&start, &moved) - 37.0).abs() < 1e-6);
    }

    #[test]
    fn offset_wraps_longitude() {
        let start = Location::new(0.0, 179.999);
        let moved = offset(&start, 10_000.0, 90.0);
        assert!(moved.lng < -179.0);
    }

    #[test]
    fn validity_checks_ranges() {
        assert!(Location::new(90.0, -180.0).is_valid());
        assert!(!Location::new(90.1, 0.0).is_valid());
        assert!(!Location::new(0.0, f64::NAN).is_valid());
    }
}
