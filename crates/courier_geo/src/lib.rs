pub mod coordinate;
pub mod distance;
pub mod geometry;
pub mod polyline;
pub mod route_result;
pub mod tracked_position;
