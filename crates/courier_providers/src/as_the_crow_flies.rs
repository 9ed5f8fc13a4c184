use courier_geo::{
    coordinate::Coordinate, distance::haversine_distance_meters, route_result::RouteResult,
};

/// Straight line between both points, travelled at `speed_kmh`.
pub fn as_the_crow_flies_route(
    origin: Coordinate,
    destination: Coordinate,
    speed_kmh: f64,
) -> RouteResult {
    let distance_meters = haversine_distance_meters(&origin, &destination);
    let duration_seconds = if speed_kmh > 0.0 {
        distance_meters * 3.6 / speed_kmh
    } else {
        0.0
    };

    RouteResult::new(vec![origin, destination], distance_meters, duration_seconds)
}
