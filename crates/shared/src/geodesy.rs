//! Geodesy helpers.
//!
//! All distances are great-circle distances on a spherical Earth. Zones in
//! this system are municipal-scale, so the spherical model is accurate enough
//! and keeps results stable across platforms.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by every distance computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees.
///
/// Range checks are the caller's job (see [`crate::validation`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(*self, *other)
    }
}

/// Planar view used by containment tests: x = longitude, y = latitude.
impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::coord! { x: c.longitude, y: c.latitude }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }
}

/// Haversine distance between two coordinates in meters.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_same_point_is_zero() {
        let p = Coordinate::new(-6.2, 106.816666);
        assert_eq!(haversine_distance(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        // 2 * pi * R / 360
        assert!((d - 111_194.93).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_haversine_small_longitude_step_at_equator() {
        let d = haversine_distance(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0001));
        assert!((d - 11.119).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = Coordinate::new(-7.25, 112.75);
        let b = Coordinate::new(-7.26, 112.73);
        assert_eq!(haversine_distance(a, b), haversine_distance(b, a));
    }

    #[test]
    fn test_coordinate_accepts_short_field_names() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5}"#).unwrap();
        assert_eq!(c, Coordinate::new(1.5, 2.5));

        let c: Coordinate =
            serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#).unwrap();
        assert_eq!(c, Coordinate::new(1.5, 2.5));
    }

    #[test]
    fn test_coordinate_geo_axis_order() {
        let coord: geo::Coord<f64> = Coordinate::new(10.0, 20.0).into();
        assert_eq!(coord.x, 20.0);
        assert_eq!(coord.y, 10.0);
        assert_eq!(Coordinate::from(coord), Coordinate::new(10.0, 20.0));
    }

    #[test]
    fn test_is_finite() {
        assert!(Coordinate::new(0.0, 0.0).is_finite());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_finite());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_finite());
    }
}
