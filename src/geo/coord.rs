//! Latitude/longitude coordinates on a spherical earth.

use crate::error::{GaiaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_MILES: f64 = 3963.191;

/// Kilometres per statute mile.
pub const KM_PER_MILE: f64 = 1.609344;

/// Distance reported when the great-circle computation goes badly wrong.
pub const INVALID_DISTANCE_MILES: f64 = 1_000_000.0;

/// Minimum latitude in degrees.
pub const MIN_LATITUDE: f64 = -90.0;
/// Maximum latitude in degrees.
pub const MAX_LATITUDE: f64 = 90.0;
/// Minimum longitude in degrees.
pub const MIN_LONGITUDE: f64 = -180.0;
/// Maximum longitude in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// A point on the earth's surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Latitude, in [-90, 90].
    pub lat: f64,
    /// Longitude, in [-180, 180].
    pub long: f64,
}

#[inline]
fn wrap_longitude(mut long: f64) -> f64 {
    while long > MAX_LONGITUDE {
        long -= 360.0;
    }
    while long < MIN_LONGITUDE {
        long += 360.0;
    }
    long
}

impl Coord {
    /// Creates a coordinate, wrapping the longitude into range.
    ///
    /// Fails for non-finite values or a latitude outside [-90, 90].
    pub fn new(lat: f64, long: f64) -> Result<Self> {
        if !lat.is_finite() || !long.is_finite() || !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat)
        {
            return Err(GaiaError::InvalidCoordinate { lat, long });
        }
        Ok(Self {
            lat,
            long: wrap_longitude(long),
        })
    }

    /// Creates a coordinate, clamping the latitude and wrapping the
    /// longitude. `lat` and `long` must be finite.
    pub fn coerced(lat: f64, long: f64) -> Self {
        Self {
            lat: lat.clamp(MIN_LATITUDE, MAX_LATITUDE),
            long: wrap_longitude(long),
        }
    }

    /// Great-circle distance in miles.
    pub fn distance_miles(&self, other: &Coord) -> f64 {
        let (lat1, long1) = (self.lat.to_radians(), self.long.to_radians());
        let (lat2, long2) = (other.lat.to_radians(), other.long.to_radians());

        let anglecos = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (long2 - long1).cos();

        // Identical or nearly identical points can push the cosine slightly
        // past 1.
        if anglecos.abs() > 1.0 {
            if anglecos.abs() > 1.000001 {
                log::warn!(
                    "Out-of-range cosine {} computing distance between {} and {}",
                    anglecos,
                    self,
                    other
                );
                return INVALID_DISTANCE_MILES;
            }
            return 0.0;
        }
        EARTH_RADIUS_MILES * anglecos.acos()
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &Coord) -> f64 {
        self.distance_miles(other) * KM_PER_MILE
    }

    /// Euclidean distance in degrees, ignoring curvature and wraparound.
    pub fn degree_distance(&self, other: &Coord) -> f64 {
        let dlat = self.lat - other.lat;
        let dlong = self.long - other.long;
        (dlat * dlat + dlong * dlong).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2},{:.2})", self.lat, self.long)
    }
}
