//! Coordinates and great-circle distance.
//!
//! Everything here is pure: no I/O, no shared state. Distances are
//! kilometers on a sphere of the Earth's mean radius.

use crate::error::CoordinateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate without range checks.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate, rejecting values outside [-90, 90] x [-180, 180].
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(CoordinateError {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Great-circle distance between `a` and `b` in kilometers (Haversine).
///
/// Inputs are not validated; out-of-range coordinates give meaningless
/// but finite results.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = ((d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEORGE: Coordinate = Coordinate::new(-33.9715, 22.4617);
    const CAPE_TOWN: Coordinate = Coordinate::new(-33.9249, 18.4241);

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(haversine_km(GEORGE, GEORGE), 0.0);
        assert_eq!(haversine_km(CAPE_TOWN, CAPE_TOWN), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (GEORGE, CAPE_TOWN),
            (Coordinate::new(52.52, 13.405), Coordinate::new(48.8566, 2.3522)),
            (Coordinate::new(-89.9, 179.9), Coordinate::new(89.9, -179.9)),
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0001)),
        ];
        for (a, b) in pairs {
            let ab = haversine_km(a, b);
            let ba = haversine_km(b, a);
            assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0), "{a} / {b}");
        }
    }

    #[test]
    fn george_to_cape_town() {
        let d = haversine_km(GEORGE, CAPE_TOWN);
        assert!((d - 372.44).abs() < 1.0, "got {d}");
    }

    #[test]
    fn antipodes_are_half_the_circumference() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

        let poles = haversine_km(Coordinate::new(90.0, 0.0), Coordinate::new(-90.0, 0.0));
        assert!((poles - 20015.086).abs() < 0.01);
    }

    #[test]
    fn approaching_never_increases_distance() {
        let start = Coordinate::new(-25.7479, 28.2293);
        let mut last = f64::INFINITY;
        for step in 0..=20 {
            let t = f64::from(step) / 20.0;
            let p = Coordinate::new(
                start.latitude + (GEORGE.latitude - start.latitude) * t,
                start.longitude + (GEORGE.longitude - start.longitude) * t,
            );
            let d = haversine_km(p, GEORGE);
            assert!(d <= last, "step {step}: {d} > {last}");
            last = d;
        }
        assert!(last < 1e-9);
    }

    #[test]
    fn try_new_checks_ranges() {
        assert!(Coordinate::try_new(90.0, 180.0).is_ok());
        assert!(Coordinate::try_new(-90.0, -180.0).is_ok());
        assert!(Coordinate::try_new(90.1, 0.0).is_err());
        assert!(Coordinate::try_new(0.0, -180.5).is_err());
        assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn deserializes_short_field_names() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": -33.9, "lon": 18.4}"#).unwrap();
        assert_eq!(c, Coordinate::new(-33.9, 18.4));
        let c: Coordinate = toml::from_str("lat = 1.5\nlng = 2.5").unwrap();
        assert_eq!(c, Coordinate::new(1.5, 2.5));
    }
}
