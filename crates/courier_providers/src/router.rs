use std::sync::Arc;

use courier_geo::{coordinate::Coordinate, route_result::RouteResult};
use futures::future::BoxFuture;

use crate::error::RouteError;

/// Computes a driving route between two coordinates.
pub trait Router: Send + Sync {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>>;
}

impl<R: Router + ?Sized> Router for Arc<R> {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
        (**self).fetch_route(origin, destination)
    }
}
