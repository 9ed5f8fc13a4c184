use crate::{
    coordinate::Coordinate, distance::haversine_distance_meters, route_result::RouteResult,
};

pub fn polyline_length_meters(polyline: &[Coordinate]) -> f64 {
    polyline
        .windows(2)
        .map(|leg| haversine_distance_meters(&leg[0], &leg[1]))
        .sum()
}

pub fn closest_point_index(points: &[Coordinate], point: &Coordinate) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|(_, p), (_, p2)| {
            haversine_distance_meters(point, p).total_cmp(&haversine_distance_meters(point, p2))
        })
        .map(|v| v.0)
}

/// Splits the polyline at the vertex closest to `point`, returning the
/// travelled and the remaining part. The closest vertex starts the
/// remaining part.
pub fn split_polyline<'a>(
    points: &'a [Coordinate],
    point: &Coordinate,
) -> (&'a [Coordinate], &'a [Coordinate]) {
    match closest_point_index(points, point) {
        None => (points, &[]),
        Some(index) => points.split_at(index),
    }
}

/// Distance left to drive from `position`: from the position to the
/// closest route vertex, then along the route to its end.
pub fn remaining_distance_meters(route: &RouteResult, position: &Coordinate) -> Option<f64> {
    let (_, remaining) = split_polyline(&route.polyline, position);
    let first = remaining.first()?;

    Some(haversine_distance_meters(position, first) + polyline_length_meters(remaining))
}
