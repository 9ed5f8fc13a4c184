use std::sync::Arc;

use courier_geo::coordinate::Coordinate;
use futures::future::BoxFuture;

use crate::error::GeocodeError;

/// Resolves a free-text address to a coordinate.
pub trait Geocoder: Send + Sync {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>>;
}

impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
        (**self).geocode(address)
    }
}
