use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// A routed path with its length and travel time, as returned by a
/// directions provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub polyline: Vec<Coordinate>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteResult {
    pub fn new(polyline: Vec<Coordinate>, distance_meters: f64, duration_seconds: f64) -> Self {
        Self {
            polyline,
            distance_meters,
            duration_seconds,
        }
    }

    pub fn destination(&self) -> Option<&Coordinate> {
        self.polyline.last()
    }
}
