use std::time::Duration;

use courier_geo::tracked_position::TrackedPosition;
use futures::SinkExt;
use serde::Serialize;
use thiserror::Error;
use tokio::{net::TcpStream, sync::Mutex};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};

pub const DEFAULT_TRANSMIT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("transmission timed out")]
    Timeout,

    #[error("backend answered with status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("websocket channel error: {0}")]
    Channel(String),

    #[error("failed to encode position: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransmitError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransmitError::Timeout
        } else {
            TransmitError::Network(error.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Put,
    Post,
}

#[derive(Serialize)]
struct LocationBody {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DriverLocationMessage<'a> {
    driver_id: &'a str,
    latitude: f64,
    longitude: f64,
}

pub struct HttpSink {
    method: HttpMethod,
    url: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(method: HttpMethod, url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TRANSMIT_TIMEOUT)
            .build()?;
        Ok(Self {
            method,
            url,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, position: &TrackedPosition) -> Result<(), TransmitError> {
        let body = LocationBody {
            latitude: position.coordinate.latitude(),
            longitude: position.coordinate.longitude(),
        };

        let request = match self.method {
            HttpMethod::Put => self.client.put(&self.url),
            HttpMethod::Post => self.client.post(&self.url),
        };
        let response = request.json(&body).send().await?;

        if !response.status().is_success() {
            return Err(TransmitError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

type Connection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A persistent socket to the realtime backend. Connects on first use and
/// reconnects on the next send after any failure.
pub struct WebSocketChannel {
    url: String,
    driver_id: String,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl WebSocketChannel {
    pub fn new(url: String, driver_id: String) -> Self {
        Self {
            url,
            driver_id,
            timeout: DEFAULT_TRANSMIT_TIMEOUT,
            connection: Mutex::new(None),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .try_lock()
            .map(|connection| connection.is_some())
            .unwrap_or(true)
    }

    async fn send(&self, position: &TrackedPosition) -> Result<(), TransmitError> {
        let payload = serde_json::to_string(&DriverLocationMessage {
            driver_id: &self.driver_id,
            latitude: position.coordinate.latitude(),
            longitude: position.coordinate.longitude(),
        })?;

        let mut connection = self.connection.lock().await;

        if connection.is_none() {
            debug!("WebSocketChannel: connecting to {}", self.url);
            let (stream, _) = tokio::time::timeout(self.timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| TransmitError::Timeout)?
                .map_err(|err| TransmitError::Channel(err.to_string()))?;
            *connection = Some(stream);
        }

        let Some(stream) = connection.as_mut() else {
            return Err(TransmitError::Channel("not connected".to_string()));
        };

        let sent = tokio::time::timeout(self.timeout, stream.send(Message::text(payload))).await;
        let result = match sent {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => TransmitError::Channel(err.to_string()),
            Err(_) => TransmitError::Timeout,
        };

        warn!("WebSocketChannel: dropping connection, {}", result);
        *connection = None;

        Err(result)
    }
}

pub enum PositionSink {
    Http(HttpSink),
    WebSocket(WebSocketChannel),
}

impl PositionSink {
    /// `PUT {base}/admin/trips/{trip_id}/location`
    pub fn trip_location(base_url: &str, trip_id: &str) -> Result<Self, reqwest::Error> {
        let url = format!(
            "{}/admin/trips/{}/location",
            base_url.trim_end_matches('/'),
            trip_id
        );
        Ok(PositionSink::Http(HttpSink::new(HttpMethod::Put, url)?))
    }

    /// `POST {base}/driver/{driver_id}/location`
    pub fn driver_location(base_url: &str, driver_id: &str) -> Result<Self, reqwest::Error> {
        let url = format!(
            "{}/driver/{}/location",
            base_url.trim_end_matches('/'),
            driver_id
        );
        Ok(PositionSink::Http(HttpSink::new(HttpMethod::Post, url)?))
    }

    pub fn websocket(url: String, driver_id: String) -> Self {
        PositionSink::WebSocket(WebSocketChannel::new(url, driver_id))
    }

    pub fn describe(&self) -> &str {
        match self {
            PositionSink::Http(sink) => sink.url(),
            PositionSink::WebSocket(channel) => &channel.url,
        }
    }
}

pub async fn transmit_position(
    position: &TrackedPosition,
    sink: &PositionSink,
) -> Result<(), TransmitError> {
    match sink {
        PositionSink::Http(http) => http.send(position).await,
        PositionSink::WebSocket(channel) => channel.send(position).await,
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::test_utils::{http_response, position, spawn_http_responder};

    use super::*;

    #[tokio::test]
    async fn test_trip_location_put() {
        let (url, mut requests) =
            spawn_http_responder(http_response("200 OK", "application/json", "{}")).await;
        let sink = PositionSink::trip_location(&format!("{url}/"), "42").unwrap();

        transmit_position(&position(6.5244, 3.3792, 0), &sink)
            .await
            .unwrap();

        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("PUT /admin/trips/42/location "));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body, json!({"latitude": 6.5244, "longitude": 3.3792}));
    }

    #[tokio::test]
    async fn test_driver_location_status_error() {
        let (url, mut requests) = spawn_http_responder(http_response(
            "500 Internal Server Error",
            "text/plain",
            "boom",
        ))
        .await;
        let sink = PositionSink::driver_location(&url, "d-7").unwrap();

        let result = transmit_position(&position(1.0, 2.0, 0), &sink).await;

        assert!(matches!(result, Err(TransmitError::Status(500))));
        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("POST /driver/d-7/location "));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let sink = PositionSink::trip_location(&format!("http://{address}"), "1").unwrap();
        let result = transmit_position(&position(1.0, 2.0, 0), &sink).await;

        assert!(matches!(result, Err(TransmitError::Network(_))));
    }

    #[tokio::test]
    async fn test_websocket_reuses_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (sender, mut received) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = tokio_tungstenite::accept_async(socket).await.unwrap();
            while let Some(Ok(message)) = stream.next().await {
                if let Message::Text(text) = message {
                    sender.send(text.to_string()).unwrap();
                }
            }
        });

        let sink = PositionSink::websocket(format!("ws://{address}"), "d-7".to_string());
        assert!(matches!(&sink, PositionSink::WebSocket(channel) if !channel.is_connected()));

        transmit_position(&position(1.0, 2.0, 0), &sink).await.unwrap();
        transmit_position(&position(3.0, 4.0, 1), &sink).await.unwrap();

        let first: serde_json::Value =
            serde_json::from_str(&received.recv().await.unwrap()).unwrap();
        let second: serde_json::Value =
            serde_json::from_str(&received.recv().await.unwrap()).unwrap();
        assert_eq!(first, json!({"driverId": "d-7", "latitude": 1.0, "longitude": 2.0}));
        assert_eq!(second, json!({"driverId": "d-7", "latitude": 3.0, "longitude": 4.0}));
    }

    #[tokio::test]
    async fn test_websocket_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let sink = PositionSink::websocket(format!("ws://{address}"), "d-7".to_string());
        let result = transmit_position(&position(1.0, 2.0, 0), &sink).await;

        assert!(matches!(result, Err(TransmitError::Channel(_))));
    }
}
