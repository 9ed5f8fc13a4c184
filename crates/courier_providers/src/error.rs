use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("no result for address")]
    NotFound,

    #[error("geocoding request timed out")]
    Timeout,

    #[error("geocoding provider error: {0}")]
    ProviderError(String),
}

impl GeocodeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeocodeError::NotFound)
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::ProviderError(error.to_string())
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouteError {
    #[error("routing request timed out")]
    Timeout,

    #[error("no route between origin and destination")]
    NoRoute,

    #[error("routing provider error: {0}")]
    ProviderError(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RouteError::Timeout
        } else {
            RouteError::ProviderError(error.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderConfigError {
    #[error("{0} is required for the selected provider")]
    MissingVariable(&'static str),

    #[error("unknown provider {0:?}")]
    UnknownProvider(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
