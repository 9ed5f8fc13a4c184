use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// A device fix as reported by a position source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPosition {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub captured_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_degrees: Option<f64>,
}

impl TrackedPosition {
    pub fn new(coordinate: Coordinate, captured_at: Timestamp) -> Self {
        Self {
            coordinate,
            captured_at,
            accuracy_meters: None,
            heading_degrees: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = Some(accuracy_meters);
        self
    }

    pub fn with_heading(mut self, heading_degrees: f64) -> Self {
        self.heading_degrees = Some(heading_degrees);
        self
    }
}
