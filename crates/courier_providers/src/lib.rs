pub mod as_the_crow_flies;
pub mod cache;
pub mod error;
pub mod geocoder;
pub mod google_maps_api;
pub mod nominatim_api;
pub mod osrm_api;
pub mod provider;
pub mod provider_client;
pub mod router;

/// Upper bound for any single provider request.
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(8);
