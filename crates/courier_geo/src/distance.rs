use crate::coordinate::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance using the haversine formula.
pub fn haversine_distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lng = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn haversine_distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_distance_km(a, b) * 1000.0
}

/// Initial bearing in degrees in `[0, 360)` from `from` to `to`.
///
/// Identical points have no bearing, 0 is returned.
pub fn compute_heading(from: &Coordinate, to: &Coordinate) -> f64 {
    if from == to {
        return 0.0;
    }

    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();
    let theta = y.atan2(x);

    (theta.to_degrees() + 360.0) % 360.0
}
