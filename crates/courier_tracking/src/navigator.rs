use std::sync::Arc;

use courier_geo::{
    coordinate::Coordinate,
    distance::{haversine_distance_km, haversine_distance_meters},
    geometry,
    route_result::RouteResult,
};
use courier_providers::{
    cache::{GeocodeCache, RouteCache},
    error::{GeocodeError, RouteError},
    geocoder::Geocoder,
    router::Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// When a route that already exists gets fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefetchPolicy {
    /// Only a new destination triggers a new route.
    #[default]
    OnDestinationChange,

    /// Also refetch once the driver is further than `threshold_meters`
    /// from where the current route starts.
    OnDrift { threshold_meters: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub route: RouteResult,
}

/// Recoverable problems surfaced to the driver while tracking continues.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorNotice {
    DestinationUnavailable(GeocodeError),
    RouteUnavailable(RouteError),
}

pub struct Navigator {
    geocoder: Arc<dyn Geocoder>,
    router: Arc<dyn Router>,
    policy: RefetchPolicy,
    geocode_cache: GeocodeCache,
    route_cache: RouteCache,
    destination_query: Option<String>,
    destination: Option<Coordinate>,
    origin: Option<Coordinate>,
    leg: Option<RouteLeg>,
    notice: Option<NavigatorNotice>,
}

impl Navigator {
    pub fn new(geocoder: Arc<dyn Geocoder>, router: Arc<dyn Router>, policy: RefetchPolicy) -> Self {
        Self {
            geocoder,
            router,
            policy,
            geocode_cache: GeocodeCache::default(),
            route_cache: RouteCache::default(),
            destination_query: None,
            destination: None,
            origin: None,
            leg: None,
            notice: None,
        }
    }

    pub fn policy(&self) -> RefetchPolicy {
        self.policy
    }

    /// Resolves `address` and routes to it from the last known origin.
    /// A failed lookup clears the destination.
    pub async fn set_destination(&mut self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.destination_query = Some(address.to_string());

        match self
            .geocode_cache
            .resolve(self.geocoder.as_ref(), address)
            .await
        {
            Ok(coordinate) => {
                self.set_destination_coordinate(coordinate).await;
                Ok(coordinate)
            }
            Err(err) => {
                warn!("Navigator: could not geocode {:?}: {}", address, err);
                self.drop_destination();
                self.notice = Some(NavigatorNotice::DestinationUnavailable(err.clone()));
                Err(err)
            }
        }
    }

    pub async fn set_destination_coordinate(&mut self, destination: Coordinate) {
        if let Some(previous) = self.destination
            && previous.key() != destination.key()
        {
            debug!("Navigator: destination moved from {} to {}", previous, destination);
            self.route_cache.invalidate_destination(&previous);
            self.leg = None;
        }

        self.destination = Some(destination);
        self.notice = None;

        if self.leg.is_none() {
            self.refresh_route().await;
        }
    }

    pub fn clear_destination(&mut self) {
        self.drop_destination();
        self.destination_query = None;
        self.notice = None;
    }

    /// Records the driver's position without touching the route.
    pub fn set_origin(&mut self, origin: Coordinate) {
        self.origin = Some(origin);
    }

    /// Records the driver's position and refetches the route when the
    /// policy asks for it. A missing route is retried here.
    pub async fn update_origin(&mut self, origin: Coordinate) {
        self.origin = Some(origin);

        if self.destination.is_none() {
            return;
        }

        let refetch = match (&self.leg, self.policy) {
            (None, _) => true,
            (Some(_), RefetchPolicy::OnDestinationChange) => false,
            (Some(leg), RefetchPolicy::OnDrift { threshold_meters }) => {
                haversine_distance_meters(&leg.origin, &origin) > threshold_meters
            }
        };

        if !refetch {
            return;
        }

        // a drifted-from route is never asked for again
        if let Some(leg) = &self.leg {
            debug!("Navigator: drifted off the route starting at {}", leg.origin);
            self.route_cache.invalidate(&leg.origin, &leg.destination);
        }

        self.refresh_route().await;
    }

    async fn refresh_route(&mut self) {
        let (Some(origin), Some(destination)) = (self.origin, self.destination) else {
            return;
        };

        match self
            .route_cache
            .resolve(self.router.as_ref(), origin, destination)
            .await
        {
            Ok(route) => {
                info!(
                    "Navigator: route {} -> {}: {:.0} m, {:.0} s",
                    origin, destination, route.distance_meters, route.duration_seconds
                );
                self.leg = Some(RouteLeg {
                    origin,
                    destination,
                    route,
                });
                self.notice = None;
            }
            Err(err) => {
                warn!("Navigator: no route {} -> {}: {}", origin, destination, err);
                self.leg = None;
                self.notice = Some(NavigatorNotice::RouteUnavailable(err));
            }
        }
    }

    fn drop_destination(&mut self) {
        if let Some(previous) = self.destination.take() {
            self.route_cache.invalidate_destination(&previous);
        }
        self.leg = None;
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.destination
    }

    pub fn destination_query(&self) -> Option<&str> {
        self.destination_query.as_deref()
    }

    pub fn origin(&self) -> Option<Coordinate> {
        self.origin
    }

    pub fn leg(&self) -> Option<&RouteLeg> {
        self.leg.as_ref()
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.leg.as_ref().map(|leg| &leg.route)
    }

    pub fn eta_seconds(&self) -> Option<f64> {
        self.route().map(|route| route.duration_seconds)
    }

    pub fn distance_meters(&self) -> Option<f64> {
        self.route().map(|route| route.distance_meters)
    }

    pub fn straight_line_km(&self, origin: &Coordinate) -> Option<f64> {
        self.destination
            .map(|destination| haversine_distance_km(origin, &destination))
    }

    /// Distance left along the route from the point closest to `origin`.
    pub fn remaining_distance_meters(&self, origin: &Coordinate) -> Option<f64> {
        self.route()
            .and_then(|route| geometry::remaining_distance_meters(route, origin))
    }

    pub fn notice(&self) -> Option<&NavigatorNotice> {
        self.notice.as_ref()
    }

    pub fn cached_routes(&self) -> usize {
        self.route_cache.len()
    }

    /// Forgets everything, caches included.
    pub fn reset(&mut self) {
        self.geocode_cache.clear();
        self.route_cache.clear();
        self.destination_query = None;
        self.destination = None;
        self.origin = None;
        self.leg = None;
        self.notice = None;
    }
}
