use courier_geo::{coordinate::Coordinate, route_result::RouteResult};
use futures::{FutureExt, future::BoxFuture};

use crate::{
    as_the_crow_flies::as_the_crow_flies_route,
    error::{GeocodeError, ProviderConfigError, RouteError},
    geocoder::Geocoder,
    google_maps_api::{GoogleMapsClient, GoogleMapsClientParams},
    nominatim_api::{NominatimClient, NominatimClientParams},
    osrm_api::{OsrmClient, OsrmClientParams},
    provider::{GeocodeProvider, RouteProvider},
    router::Router,
};

pub const GOOGLE_MAPS_API_KEY_ENV_VAR: &str = "GOOGLE_MAPS_API_KEY";
pub const OSRM_URL_ENV_VAR: &str = "COURIER_OSRM_URL";
pub const NOMINATIM_URL_ENV_VAR: &str = "COURIER_NOMINATIM_URL";

#[derive(Default)]
pub struct ProviderClientParams {
    pub geocode_provider: GeocodeProvider,
    pub route_provider: RouteProvider,
    pub google_api_key: Option<String>,
    pub osrm_url: Option<String>,
    pub nominatim_url: Option<String>,
}

impl ProviderClientParams {
    /// Fills the credentials and URLs from the environment.
    pub fn from_env(geocode_provider: GeocodeProvider, route_provider: RouteProvider) -> Self {
        Self {
            geocode_provider,
            route_provider,
            google_api_key: std::env::var(GOOGLE_MAPS_API_KEY_ENV_VAR).ok(),
            osrm_url: std::env::var(OSRM_URL_ENV_VAR).ok(),
            nominatim_url: std::env::var(NOMINATIM_URL_ENV_VAR).ok(),
        }
    }
}

/// Geocodes and routes through whichever providers were selected.
pub struct ProviderClient {
    geocode_provider: GeocodeProvider,
    route_provider: RouteProvider,
    google_maps_client: Option<GoogleMapsClient>,
    nominatim_client: NominatimClient,
    osrm_client: Option<OsrmClient>,
}

impl ProviderClient {
    pub fn new(params: ProviderClientParams) -> Result<Self, ProviderConfigError> {
        let needs_google = params.geocode_provider == GeocodeProvider::GoogleMaps
            || params.route_provider == RouteProvider::GoogleMaps;

        let google_maps_client = match params.google_api_key {
            Some(api_key) => Some(GoogleMapsClient::new(GoogleMapsClientParams::new(api_key))?),
            None if needs_google => {
                return Err(ProviderConfigError::MissingVariable(
                    GOOGLE_MAPS_API_KEY_ENV_VAR,
                ));
            }
            None => None,
        };

        let osrm_client = match params.osrm_url {
            Some(osrm_url) => Some(OsrmClient::new(OsrmClientParams::new(osrm_url))?),
            None if params.route_provider == RouteProvider::Osrm => {
                return Err(ProviderConfigError::MissingVariable(OSRM_URL_ENV_VAR));
            }
            None => None,
        };

        let mut nominatim_params = NominatimClientParams::default();
        if let Some(nominatim_url) = params.nominatim_url {
            nominatim_params.api_url = nominatim_url;
        }

        Ok(Self {
            geocode_provider: params.geocode_provider,
            route_provider: params.route_provider,
            google_maps_client,
            nominatim_client: NominatimClient::new(nominatim_params)?,
            osrm_client,
        })
    }

    pub fn geocode_provider(&self) -> GeocodeProvider {
        self.geocode_provider
    }

    pub fn route_provider(&self) -> RouteProvider {
        self.route_provider
    }

    pub async fn geocode_address(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        match (self.geocode_provider, &self.google_maps_client) {
            (GeocodeProvider::GoogleMaps, Some(client)) => client.geocode_address(address).await,
            (GeocodeProvider::GoogleMaps, None) => Err(GeocodeError::ProviderError(
                "Google Maps client is not configured".to_string(),
            )),
            (GeocodeProvider::Nominatim, _) => self.nominatim_client.search(address).await,
        }
    }

    pub async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        match self.route_provider {
            RouteProvider::GoogleMaps => match &self.google_maps_client {
                Some(client) => client.fetch_directions(origin, destination).await,
                None => Err(RouteError::ProviderError(
                    "Google Maps client is not configured".to_string(),
                )),
            },
            RouteProvider::Osrm => match &self.osrm_client {
                Some(client) => client.route(origin, destination).await,
                None => Err(RouteError::ProviderError(
                    "OSRM client is not configured".to_string(),
                )),
            },
            RouteProvider::AsTheCrowFlies { speed_kmh } => {
                Ok(as_the_crow_flies_route(origin, destination, speed_kmh))
            }
        }
    }
}

impl Geocoder for ProviderClient {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
        self.geocode_address(address).boxed()
    }
}

impl Router for ProviderClient {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
        self.route(origin, destination).boxed()
    }
}
