//! Coordinates and great-circle distance.
//!
//! Distances use the Haversine formula on a spherical Earth (R = 6371 km).
//! Good to ~0.5% against the WGS-84 ellipsoid, which is plenty for ranking
//! cities a few kilometres apart.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude rejected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Invalid coordinates: lat={lat}, lon={lon}")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A validated point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoord")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

/// Unchecked lat/lon pair as it appears in provider payloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoord {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
        if lat_ok && lon_ok {
            Ok(Self { lat, lon })
        } else {
            Err(InvalidCoordinate { lat, lon })
        }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl TryFrom<RawCoord> for Coordinate {
    type Error = InvalidCoordinate;

    fn try_from(raw: RawCoord) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

/// Renders as the `"lat,lon"` form the weather provider accepts as a query.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// Great-circle distance between two points in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
