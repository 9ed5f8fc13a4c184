use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal digits kept by [`CoordinateKey`], roughly one meter.
pub const KEY_PRECISION: i32 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Rounds both axes to `digits` decimal places.
    pub fn rounded(&self, digits: i32) -> Coordinate {
        let factor = 10f64.powi(digits);
        Coordinate {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::from(self)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl TryFrom<geo_types::Point> for Coordinate {
    type Error = CoordinateError;

    fn try_from(point: geo_types::Point) -> Result<Self, Self::Error> {
        Coordinate::new(point.y(), point.x())
    }
}

impl From<&Coordinate> for geo_types::Point {
    fn from(coordinate: &Coordinate) -> Self {
        geo_types::Point::new(coordinate.longitude, coordinate.latitude)
    }
}

impl From<Coordinate> for geo_types::Point {
    fn from(coordinate: Coordinate) -> Self {
        geo_types::Point::from(&coordinate)
    }
}

impl From<&Coordinate> for geo_types::Coord {
    fn from(coordinate: &Coordinate) -> Self {
        geo_types::Coord {
            x: coordinate.longitude,
            y: coordinate.latitude,
        }
    }
}

/// Hashable form of a coordinate at [`KEY_PRECISION`] digits, so that
/// GPS jitter under a meter maps to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    latitude: i64,
    longitude: i64,
}

impl From<&Coordinate> for CoordinateKey {
    fn from(coordinate: &Coordinate) -> Self {
        let factor = 10f64.powi(KEY_PRECISION);
        CoordinateKey {
            latitude: (coordinate.latitude * factor).round() as i64,
            longitude: (coordinate.longitude * factor).round() as i64,
        }
    }
}
