use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

use crate::trip_feed::{RecordId, Trip};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend answered with status {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: RecordId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub license_id: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub trips_count: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub years_experience: Option<u32>,
}

impl Driver {
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A delivery order. `location` is the free-text destination address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispatch {
    pub id: RecordId,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub recipient: Option<serde_json::Value>,
    #[serde(default)]
    pub invoice: Option<serde_json::Value>,
}

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn driver(&self, driver_id: &str) -> Result<Driver, BackendError> {
        self.get(&format!("/admin/drivers/{driver_id}")).await
    }

    pub async fn driver_trips(&self, driver_id: &str) -> Result<Vec<Trip>, BackendError> {
        self.get(&format!("/admin/drivers/{driver_id}/trips")).await
    }

    pub async fn dispatch(&self, dispatch_id: &str) -> Result<Dispatch, BackendError> {
        self.get(&format!("/admin/dispatches/{dispatch_id}")).await
    }

    pub async fn dispatch_trips(&self, dispatch_id: &str) -> Result<Vec<Trip>, BackendError> {
        self.get(&format!("/dispatches/{dispatch_id}/trips")).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("BackendClient: GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, message });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{http_response, spawn_http_responder};

    use super::*;

    #[tokio::test]
    async fn test_driver_profile() {
        let body = r#"{
            "id": 12,
            "firstName": "Ada",
            "lastName": "Obi",
            "licenseId": "LAG-2231",
            "tripsCount": 48,
            "rating": 4.8
        }"#;
        let (url, mut requests) =
            spawn_http_responder(http_response("200 OK", "application/json", body)).await;
        let client = BackendClient::new(&format!("{url}/")).unwrap();

        let driver = client.driver("12").await.unwrap();

        assert_eq!(driver.id, RecordId::Number(12));
        assert_eq!(driver.full_name(), "Ada Obi");
        assert_eq!(driver.license_id.as_deref(), Some("LAG-2231"));
        assert_eq!(driver.trips_count, Some(48));
        assert_eq!(driver.years_experience, None);

        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("GET /admin/drivers/12 "));
    }

    #[tokio::test]
    async fn test_dispatch_trips() {
        let body = r#"[{"id": "t-1", "status": "assigned", "destination": "12 Marina Road"}]"#;
        let (url, mut requests) =
            spawn_http_responder(http_response("200 OK", "application/json", body)).await;
        let client = BackendClient::new(&url).unwrap();

        let trips = client.dispatch_trips("d-3").await.unwrap();

        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].status.as_deref(), Some("assigned"));
        assert_eq!(trips[0].coordinate(), None);
        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("GET /dispatches/d-3/trips "));
    }

    #[tokio::test]
    async fn test_driver_trips() {
        let body = r#"[
            {"id": 7, "driverId": 12, "status": "in_progress", "latitude": 6.5244, "longitude": 3.3792},
            {"id": 8, "driverId": 12, "status": "completed"}
        ]"#;
        let (url, mut requests) =
            spawn_http_responder(http_response("200 OK", "application/json", body)).await;
        let client = BackendClient::new(&url).unwrap();

        let trips = client.driver_trips("12").await.unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].id, RecordId::Number(7));
        assert_eq!(trips[0].driver_id, Some(RecordId::Number(12)));
        assert!(trips[0].coordinate().is_some());
        assert_eq!(trips[1].status.as_deref(), Some("completed"));
        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("GET /admin/drivers/12/trips "));
    }

    #[tokio::test]
    async fn test_dispatch_not_found() {
        let (url, _requests) = spawn_http_responder(http_response(
            "404 Not Found",
            "application/json",
            r#"{"error":"dispatch not found"}"#,
        ))
        .await;
        let client = BackendClient::new(&url).unwrap();

        let result = client.dispatch("404").await;

        assert!(matches!(
            result,
            Err(BackendError::Status { status: 404, ref message }) if message.contains("not found")
        ));
    }
}
