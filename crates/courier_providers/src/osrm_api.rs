use std::time::Duration;

use courier_geo::{coordinate::Coordinate, polyline::decode_polyline, route_result::RouteResult};
use futures::{FutureExt, future::BoxFuture};
use serde::Deserialize;

use crate::{DEFAULT_REQUEST_TIMEOUT, error::RouteError, router::Router};

pub const OSRM_ROUTE_API_PATH: &str = "/route/v1/driving/";

#[derive(Deserialize)]
struct OsrmRoute {
    /// Polyline with precision 5
    geometry: String,

    /// Meters
    distance: f64,

    /// Seconds
    duration: f64,
}

#[derive(Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

pub struct OsrmClientParams {
    pub osrm_url: String,
    pub timeout: Duration,
}

impl OsrmClientParams {
    pub fn new(osrm_url: String) -> Self {
        Self {
            osrm_url,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct OsrmClient {
    params: OsrmClientParams,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(params: OsrmClientParams) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(params.timeout).build()?;
        Ok(Self { params, client })
    }

    pub async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResult, RouteError> {
        let mut url = self.params.osrm_url.trim_end_matches('/').to_string();
        url.push_str(OSRM_ROUTE_API_PATH);

        // OSRM expects lon,lat pairs
        for (i, point) in [origin, destination].iter().enumerate() {
            url.push_str(&format!("{},{}", point.longitude(), point.latitude()));

            if i == 0 {
                url.push(';');
            }
        }

        let response = self
            .client
            .get(url)
            .query(&[("overview", "full"), ("geometries", "polyline")])
            .send()
            .await?;

        // NoRoute comes back as a 400 with a JSON body
        let status = response.status();
        let bytes = response.bytes().await?;
        match serde_json::from_slice::<OsrmRouteResponse>(&bytes) {
            Ok(body) => parse_route_response(body),
            Err(_) if !status.is_success() => Err(RouteError::ProviderError(format!(
                "{} - {}",
                status.as_u16(),
                String::from_utf8_lossy(&bytes)
            ))),
            Err(err) => Err(RouteError::ProviderError(err.to_string())),
        }
    }
}

impl Router for OsrmClient {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
        self.route(origin, destination).boxed()
    }
}

fn parse_route_response(body: OsrmRouteResponse) -> Result<RouteResult, RouteError> {
    match body.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(RouteError::NoRoute),
        other => {
            return Err(RouteError::ProviderError(
                body.message.unwrap_or_else(|| other.to_string()),
            ));
        }
    }

    let route = body.routes.into_iter().next().ok_or(RouteError::NoRoute)?;
    let polyline =
        decode_polyline(&route.geometry).map_err(|err| RouteError::ProviderError(err.to_string()))?;

    Ok(RouteResult::new(polyline, route.distance, route.duration))
}
