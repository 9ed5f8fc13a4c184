use courier_geo::{distance::compute_heading, tracked_position::TrackedPosition};
use serde::Serialize;

/// What the driver marker shows: the latest position and the direction of
/// travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverState {
    pub position: TrackedPosition,
    pub heading_degrees: f64,
}

impl DriverState {
    pub fn first(position: TrackedPosition) -> Self {
        Self {
            position,
            heading_degrees: position.heading_degrees.unwrap_or(0.0),
        }
    }

    /// Heading is computed from the previous position. A driver standing
    /// still keeps the last heading.
    pub fn advance(&self, position: TrackedPosition) -> Self {
        let heading_degrees = if position.coordinate == self.position.coordinate {
            self.heading_degrees
        } else {
            compute_heading(&self.position.coordinate, &position.coordinate)
        };

        Self {
            position,
            heading_degrees,
        }
    }
}

pub fn next_state(previous: Option<&DriverState>, position: TrackedPosition) -> DriverState {
    match previous {
        Some(state) => state.advance(position),
        None => DriverState::first(position),
    }
}
