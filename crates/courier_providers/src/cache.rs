//! In-memory caches owned by one tracking session. Failures are never
//! cached, so a later attempt for the same key goes back to the provider.

use courier_geo::{
    coordinate::{Coordinate, CoordinateKey},
    route_result::RouteResult,
};
use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    error::{GeocodeError, RouteError},
    geocoder::Geocoder,
    router::Router,
};

/// Address to coordinate, keyed on the exact address string.
#[derive(Default)]
pub struct GeocodeCache {
    entries: FxHashMap<String, Coordinate>,
}

impl GeocodeCache {
    pub fn get(&self, address: &str) -> Option<Coordinate> {
        self.entries.get(address).copied()
    }

    pub async fn resolve<G>(&mut self, geocoder: &G, address: &str) -> Result<Coordinate, GeocodeError>
    where
        G: Geocoder + ?Sized,
    {
        if let Some(coordinate) = self.get(address) {
            debug!("GeocodeCache: hit for {:?}", address);
            return Ok(coordinate);
        }

        let coordinate = geocoder.geocode(address).await?;
        self.entries.insert(address.to_string(), coordinate);

        Ok(coordinate)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Origin and destination rounded with [`CoordinateKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: CoordinateKey,
    destination: CoordinateKey,
}

impl RouteKey {
    pub fn new(origin: &Coordinate, destination: &Coordinate) -> Self {
        Self {
            origin: origin.key(),
            destination: destination.key(),
        }
    }
}

#[derive(Default)]
pub struct RouteCache {
    entries: FxHashMap<RouteKey, RouteResult>,
}

impl RouteCache {
    pub fn get(&self, origin: &Coordinate, destination: &Coordinate) -> Option<&RouteResult> {
        self.entries.get(&RouteKey::new(origin, destination))
    }

    pub async fn resolve<R>(
        &mut self,
        router: &R,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError>
    where
        R: Router + ?Sized,
    {
        let key = RouteKey::new(&origin, &destination);
        if let Some(route) = self.entries.get(&key) {
            debug!("RouteCache: hit for {} -> {}", origin, destination);
            return Ok(route.clone());
        }

        let route = router.fetch_route(origin, destination).await?;
        self.entries.insert(key, route.clone());

        Ok(route)
    }

    pub fn invalidate(&mut self, origin: &Coordinate, destination: &Coordinate) {
        self.entries.remove(&RouteKey::new(origin, destination));
    }

    /// Drops every route leading to `destination`.
    pub fn invalidate_destination(&mut self, destination: &Coordinate) {
        let destination = destination.key();
        self.entries.retain(|key, _| key.destination != destination);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{FutureExt, future::BoxFuture};

    use crate::as_the_crow_flies::as_the_crow_flies_route;

    use super::*;

    #[derive(Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl Geocoder for CountingGeocoder {
        fn geocode<'a>(
            &'a self,
            address: &'a str,
        ) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match address {
                    "nowhere" => Err(GeocodeError::NotFound),
                    _ => Ok(Coordinate::new(6.45, 3.39).unwrap()),
                }
            }
            .boxed()
        }
    }

    #[derive(Default)]
    struct CountingRouter {
        calls: AtomicUsize,
    }

    impl Router for CountingRouter {
        fn fetch_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(as_the_crow_flies_route(origin, destination, 30.0)) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_geocode_same_address_once() {
        let geocoder = CountingGeocoder::default();
        let mut cache = GeocodeCache::default();

        let first = cache.resolve(&geocoder, "12 Marina Road").await.unwrap();
        let second = cache.resolve(&geocoder, "12 Marina Road").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);

        // the key is the exact string
        cache.resolve(&geocoder, "12 marina road").await.unwrap();
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_geocode_failure_not_cached() {
        let geocoder = CountingGeocoder::default();
        let mut cache = GeocodeCache::default();

        assert_eq!(
            cache.resolve(&geocoder, "nowhere").await,
            Err(GeocodeError::NotFound)
        );
        assert_eq!(
            cache.resolve(&geocoder, "nowhere").await,
            Err(GeocodeError::NotFound)
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_route_cache_ignores_jitter() {
        let router = CountingRouter::default();
        let mut cache = RouteCache::default();
        let destination = Coordinate::new(6.5, 3.4).unwrap();

        cache
            .resolve(&router, Coordinate::new(6.400001, 3.300001).unwrap(), destination)
            .await
            .unwrap();
        cache
            .resolve(&router, Coordinate::new(6.400002, 3.300002).unwrap(), destination)
            .await
            .unwrap();
        assert_eq!(router.calls.load(Ordering::SeqCst), 1);

        cache
            .resolve(&router, Coordinate::new(6.41, 3.3).unwrap(), destination)
            .await
            .unwrap();
        assert_eq!(router.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_destination() {
        let router = CountingRouter::default();
        let mut cache = RouteCache::default();
        let origin = Coordinate::new(6.4, 3.3).unwrap();
        let first = Coordinate::new(6.5, 3.4).unwrap();
        let second = Coordinate::new(6.6, 3.5).unwrap();

        cache.resolve(&router, origin, first).await.unwrap();
        cache.resolve(&router, origin, second).await.unwrap();
        cache.invalidate_destination(&first);

        assert!(cache.get(&origin, &first).is_none());
        assert!(cache.get(&origin, &second).is_some());
    }

    #[tokio::test]
    async fn test_invalidate_single_route() {
        let router = CountingRouter::default();
        let mut cache = RouteCache::default();
        let destination = Coordinate::new(6.5, 3.4).unwrap();
        let start = Coordinate::new(6.4, 3.3).unwrap();
        let later = Coordinate::new(6.45, 3.35).unwrap();

        cache.resolve(&router, start, destination).await.unwrap();
        cache.resolve(&router, later, destination).await.unwrap();
        cache.invalidate(&start, &destination);

        assert!(cache.get(&start, &destination).is_none());
        assert!(cache.get(&later, &destination).is_some());
        assert_eq!(cache.len(), 1);

        cache.resolve(&router, start, destination).await.unwrap();
        assert_eq!(router.calls.load(Ordering::SeqCst), 3);
    }
}
