use std::time::Duration;

use courier_geo::coordinate::Coordinate;
use futures::{FutureExt, future::BoxFuture};
use serde::Deserialize;
use tracing::debug;

use crate::{DEFAULT_REQUEST_TIMEOUT, error::GeocodeError, geocoder::Geocoder};

pub const NOMINATIM_API_URL: &str = "https://nominatim.openstreetmap.org";
const SEARCH_API_PATH: &str = "/search";

/// Nominatim's usage policy requires an identifying user agent.
pub const NOMINATIM_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

pub struct NominatimClientParams {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for NominatimClientParams {
    fn default() -> Self {
        Self {
            api_url: NOMINATIM_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct NominatimClient {
    params: NominatimClientParams,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(params: NominatimClientParams) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(params.timeout)
            .user_agent(NOMINATIM_USER_AGENT)
            .build()?;
        Ok(Self { params, client })
    }

    pub async fn search(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let url = format!("{}{}", self.params.api_url, SEARCH_API_PATH);
        let response = self
            .client
            .get(url)
            .query(&[("format", "json"), ("limit", "1"), ("q", address)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ProviderError(format!("{status} - {message}")));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        parse_places(places)
    }
}

impl Geocoder for NominatimClient {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
        self.search(address).boxed()
    }
}

fn parse_places(places: Vec<NominatimPlace>) -> Result<Coordinate, GeocodeError> {
    let place = places.into_iter().next().ok_or(GeocodeError::NotFound)?;

    debug!("Nominatim: resolved to {:?}", place.display_name);

    let lat: f64 = place
        .lat
        .parse()
        .map_err(|_| GeocodeError::ProviderError(format!("invalid latitude {:?}", place.lat)))?;
    let lon: f64 = place
        .lon
        .parse()
        .map_err(|_| GeocodeError::ProviderError(format!("invalid longitude {:?}", place.lon)))?;

    Coordinate::new(lat, lon).map_err(|err| GeocodeError::ProviderError(err.to_string()))
}
