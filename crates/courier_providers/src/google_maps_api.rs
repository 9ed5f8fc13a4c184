use std::time::Duration;

use courier_geo::{coordinate::Coordinate, polyline::decode_polyline, route_result::RouteResult};
use futures::{FutureExt, future::BoxFuture};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    DEFAULT_REQUEST_TIMEOUT,
    error::{GeocodeError, RouteError},
    geocoder::Geocoder,
    router::Router,
};

pub const GOOGLE_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";
const GEOCODE_API_PATH: &str = "/geocode/json";
const DIRECTIONS_API_PATH: &str = "/directions/json";

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

#[derive(Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Deserialize)]
struct OverviewPolyline {
    points: String,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    error_message: Option<String>,
}

pub struct GoogleMapsClientParams {
    pub api_key: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl GoogleMapsClientParams {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: GOOGLE_MAPS_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct GoogleMapsClient {
    params: GoogleMapsClientParams,
    client: reqwest::Client,
}

impl GoogleMapsClient {
    pub fn new(params: GoogleMapsClientParams) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(params.timeout).build()?;
        Ok(Self { params, client })
    }

    pub async fn geocode_address(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let url = format!("{}{}", self.params.api_url, GEOCODE_API_PATH);
        let response = self
            .client
            .get(url)
            .query(&[("address", address), ("key", self.params.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ProviderError(format!("{status} - {message}")));
        }

        let body: GeocodeResponse = response.json().await?;
        parse_geocode_response(body)
    }

    pub async fn fetch_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        let url = format!("{}{}", self.params.api_url, DIRECTIONS_API_PATH);
        let response = self
            .client
            .get(url)
            .query(&[
                ("origin", origin.to_string()),
                ("destination", destination.to_string()),
                ("key", self.params.api_key.clone()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RouteError::ProviderError(format!("{status} - {message}")));
        }

        let body: DirectionsResponse = response.json().await?;
        parse_directions_response(body)
    }
}

impl Geocoder for GoogleMapsClient {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
        self.geocode_address(address).boxed()
    }
}

impl Router for GoogleMapsClient {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
        self.fetch_directions(origin, destination).boxed()
    }
}

fn parse_geocode_response(body: GeocodeResponse) -> Result<Coordinate, GeocodeError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NotFound),
        other => {
            warn!(status = other, message = ?body.error_message, "GoogleMaps: geocoding failed");
            return Err(GeocodeError::ProviderError(
                body.error_message.unwrap_or_else(|| other.to_string()),
            ));
        }
    }

    let result = body.results.first().ok_or(GeocodeError::NotFound)?;
    let location = &result.geometry.location;

    Coordinate::new(location.lat, location.lng)
        .map_err(|err| GeocodeError::ProviderError(err.to_string()))
}

fn parse_directions_response(body: DirectionsResponse) -> Result<RouteResult, RouteError> {
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Err(RouteError::NoRoute),
        other => {
            warn!(status = other, message = ?body.error_message, "GoogleMaps: directions failed");
            return Err(RouteError::ProviderError(
                body.error_message.unwrap_or_else(|| other.to_string()),
            ));
        }
    }

    let route = body.routes.into_iter().next().ok_or(RouteError::NoRoute)?;
    let polyline = decode_polyline(&route.overview_polyline.points)
        .map_err(|err| RouteError::ProviderError(err.to_string()))?;

    if route.legs.is_empty() {
        warn!("GoogleMaps: route without legs");
        return Err(RouteError::NoRoute);
    }

    let mut distance_meters = 0.0;
    let mut duration_seconds = 0.0;
    for leg in &route.legs {
        debug!(
            "GoogleMaps: leg {} in {}",
            leg.distance.text, leg.duration.text
        );
        distance_meters += leg.distance.value;
        duration_seconds += leg.duration.value;
    }

    Ok(RouteResult::new(polyline, distance_meters, duration_seconds))
}
