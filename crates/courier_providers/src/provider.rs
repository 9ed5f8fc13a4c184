use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProviderConfigError;

pub const DEFAULT_CROW_FLIES_SPEED_KMH: f64 = 30.0;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeProvider {
    GoogleMaps,
    /// https://nominatim.org/release-docs/latest/api/Search/
    #[default]
    Nominatim,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteProvider {
    GoogleMaps,
    Osrm,
    AsTheCrowFlies { speed_kmh: f64 },
}

impl Default for RouteProvider {
    fn default() -> Self {
        RouteProvider::AsTheCrowFlies {
            speed_kmh: DEFAULT_CROW_FLIES_SPEED_KMH,
        }
    }
}

impl FromStr for GeocodeProvider {
    type Err = ProviderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" | "google_maps" => Ok(GeocodeProvider::GoogleMaps),
            "nominatim" => Ok(GeocodeProvider::Nominatim),
            other => Err(ProviderConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Accepts `google`, `osrm`, `crow` or `crow:<speed_kmh>`.
impl FromStr for RouteProvider {
    type Err = ProviderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, speed) = match s.split_once(':') {
            Some((name, speed)) => (name, Some(speed)),
            None => (s, None),
        };

        match (name, speed) {
            ("google" | "google_maps", None) => Ok(RouteProvider::GoogleMaps),
            ("osrm", None) => Ok(RouteProvider::Osrm),
            ("crow" | "as_the_crow_flies", None) => Ok(RouteProvider::default()),
            ("crow" | "as_the_crow_flies", Some(speed)) => speed
                .parse::<f64>()
                .ok()
                .filter(|speed| *speed > 0.0)
                .map(|speed_kmh| RouteProvider::AsTheCrowFlies { speed_kmh })
                .ok_or_else(|| ProviderConfigError::UnknownProvider(s.to_string())),
            _ => Err(ProviderConfigError::UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_provider() {
        assert_eq!("osrm".parse::<RouteProvider>().unwrap(), RouteProvider::Osrm);
        assert_eq!(
            "google".parse::<RouteProvider>().unwrap(),
            RouteProvider::GoogleMaps
        );
        assert_eq!(
            "crow:45".parse::<RouteProvider>().unwrap(),
            RouteProvider::AsTheCrowFlies { speed_kmh: 45.0 }
        );
        assert_eq!(
            "crow".parse::<RouteProvider>().unwrap(),
            RouteProvider::AsTheCrowFlies {
                speed_kmh: DEFAULT_CROW_FLIES_SPEED_KMH
            }
        );
        assert!("crow:-3".parse::<RouteProvider>().is_err());
        assert!("osrm:3".parse::<RouteProvider>().is_err());
        assert!("valhalla".parse::<RouteProvider>().is_err());
    }

    #[test]
    fn test_route_provider_serde() {
        let json = serde_json::to_string(&RouteProvider::AsTheCrowFlies { speed_kmh: 20.0 }).unwrap();
        assert_eq!(json, r#"{"type":"as_the_crow_flies","speed_kmh":20.0}"#);

        let provider: RouteProvider = serde_json::from_str(r#"{"type":"osrm"}"#).unwrap();
        assert_eq!(provider, RouteProvider::Osrm);
    }

    #[test]
    fn test_parse_geocode_provider() {
        assert_eq!(
            "nominatim".parse::<GeocodeProvider>().unwrap(),
            GeocodeProvider::Nominatim
        );
        assert!("bing".parse::<GeocodeProvider>().is_err());
    }
}
