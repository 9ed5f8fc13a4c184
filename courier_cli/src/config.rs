use courier_providers::{
    error::ProviderConfigError,
    provider::{GeocodeProvider, RouteProvider},
    provider_client::{ProviderClient, ProviderClientParams},
};

pub const BACKEND_URL_ENV_VAR: &str = "COURIER_BACKEND_URL";
pub const DRIVER_ID_ENV_VAR: &str = "COURIER_DRIVER_ID";
pub const TRIP_ID_ENV_VAR: &str = "COURIER_TRIP_ID";
pub const WS_URL_ENV_VAR: &str = "COURIER_WS_URL";

/// Backend settings read from the environment, overridable by flags.
#[derive(Debug, Default, Clone)]
pub struct Config {
    pub backend_url: Option<String>,
    pub driver_id: Option<String>,
    pub trip_id: Option<String>,
    pub ws_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend_url: non_empty_var(BACKEND_URL_ENV_VAR),
            driver_id: non_empty_var(DRIVER_ID_ENV_VAR),
            trip_id: non_empty_var(TRIP_ID_ENV_VAR),
            ws_url: non_empty_var(WS_URL_ENV_VAR),
        }
    }

    pub fn require_backend_url(&self) -> anyhow::Result<&str> {
        self.backend_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("{BACKEND_URL_ENV_VAR} or --backend-url is required"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn provider_client(
    geocode_provider: GeocodeProvider,
    route_provider: RouteProvider,
) -> Result<ProviderClient, ProviderConfigError> {
    ProviderClient::new(ProviderClientParams::from_env(
        geocode_provider,
        route_provider,
    ))
}
