//! Live trip board fed by the backend's server-sent events.

use std::{fmt::Display, time::Duration};

use courier_geo::coordinate::Coordinate;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const TRIP_STREAM_PATH: &str = "/admin/trips/stream";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("trip feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("trip feed answered with status {0}")]
    Status(u16),
}

/// Backend ids come as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(id) => write!(f, "{id}"),
            RecordId::Text(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: RecordId,
    #[serde(default)]
    pub driver_id: Option<RecordId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Trip {
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude?, self.longitude?).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripFeedMessage {
    TripCreated {
        trip: Trip,
    },
    TripUpdated {
        trip: Trip,
    },
    LocationUpdate {
        trip: Trip,
    },
    TripDeleted {
        #[serde(rename = "tripId")]
        trip_id: RecordId,
    },
    TripCompleted {
        #[serde(rename = "tripId")]
        trip_id: RecordId,
    },
}

/// Trips currently on the road, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct TripBoard {
    trips: Vec<Trip>,
}

impl TripBoard {
    pub fn apply(&mut self, message: TripFeedMessage) {
        match message {
            TripFeedMessage::TripCreated { trip }
            | TripFeedMessage::TripUpdated { trip }
            | TripFeedMessage::LocationUpdate { trip } => self.upsert(trip),
            TripFeedMessage::TripDeleted { trip_id }
            | TripFeedMessage::TripCompleted { trip_id } => {
                self.trips.retain(|trip| trip.id != trip_id)
            }
        }
    }

    fn upsert(&mut self, trip: Trip) {
        match self.trips.iter_mut().find(|existing| existing.id == trip.id) {
            Some(existing) => *existing = trip,
            None => self.trips.push(trip),
        }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    /// Trips that can be drawn on a map.
    pub fn markers(&self) -> impl Iterator<Item = (&Trip, Coordinate)> {
        self.trips
            .iter()
            .filter_map(|trip| trip.coordinate().map(|coordinate| (trip, coordinate)))
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}

/// Incremental `text/event-stream` parser yielding the data of each
/// complete event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            if field == "data" {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }

        events
    }
}

pub fn trip_stream_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), TRIP_STREAM_PATH)
}

pub struct TripFeed {
    url: String,
    client: reqwest::Client,
}

impl TripFeed {
    pub fn new(url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { url, client })
    }

    /// Follows the feed until the server closes it, calling `on_board`
    /// after every applied message.
    pub async fn follow<F>(&self, mut on_board: F) -> Result<TripBoard, FeedError>
    where
        F: FnMut(&TripBoard),
    {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FeedError::Status(response.status().as_u16()));
        }

        info!("TripFeed: following {}", self.url);

        let mut board = TripBoard::default();
        let mut decoder = SseDecoder::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            for data in decoder.feed(&chunk?) {
                match serde_json::from_str::<TripFeedMessage>(&data) {
                    Ok(message) => {
                        board.apply(message);
                        on_board(&board);
                    }
                    Err(err) => debug!("TripFeed: ignoring message {:?}: {}", data, err),
                }
            }
        }

        info!("TripFeed: stream closed");
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_utils::{http_response, spawn_http_responder};

    use super::*;

    fn trip(id: i64, latitude: Option<f64>) -> Trip {
        Trip {
            id: RecordId::Number(id),
            driver_id: None,
            status: Some("in_progress".to_string()),
            destination: None,
            latitude,
            longitude: latitude.map(|_| 3.38),
        }
    }

    #[test]
    fn test_messages_parse() {
        let created: TripFeedMessage = serde_json::from_value(json!({
            "type": "trip_created",
            "trip": {"id": "t-1", "driverId": 4, "latitude": 6.5, "longitude": 3.4}
        }))
        .unwrap();
        let TripFeedMessage::TripCreated { trip } = created else {
            panic!("unexpected message");
        };
        assert_eq!(trip.id, RecordId::Text("t-1".to_string()));
        assert_eq!(trip.driver_id, Some(RecordId::Number(4)));
        assert_eq!(trip.coordinate(), Some(Coordinate::new(6.5, 3.4).unwrap()));

        let completed: TripFeedMessage =
            serde_json::from_value(json!({"type": "trip_completed", "tripId": 7})).unwrap();
        assert_eq!(
            completed,
            TripFeedMessage::TripCompleted {
                trip_id: RecordId::Number(7)
            }
        );
    }

    #[test]
    fn test_board_upserts_and_removes() {
        let mut board = TripBoard::default();

        board.apply(TripFeedMessage::TripCreated {
            trip: trip(1, Some(6.5)),
        });
        board.apply(TripFeedMessage::TripCreated { trip: trip(2, None) });
        // unknown to the board, joined late
        board.apply(TripFeedMessage::LocationUpdate {
            trip: trip(3, Some(6.6)),
        });
        board.apply(TripFeedMessage::LocationUpdate {
            trip: trip(1, Some(6.7)),
        });

        assert_eq!(board.len(), 3);
        assert_eq!(board.trips()[0].latitude, Some(6.7));
        assert_eq!(board.markers().count(), 2);

        board.apply(TripFeedMessage::TripDeleted {
            trip_id: RecordId::Number(1),
        });
        board.apply(TripFeedMessage::TripCompleted {
            trip_id: RecordId::Number(99),
        });
        assert_eq!(
            board.trips().iter().map(|trip| &trip.id).collect::<Vec<_>>(),
            vec![&RecordId::Number(2), &RecordId::Number(3)]
        );
    }

    #[test]
    fn test_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();

        assert!(decoder.feed(b": keep-alive\n\ndata: {\"a\"").is_empty());
        assert!(decoder.feed(b":1}\r\n").is_empty());
        assert_eq!(decoder.feed(b"\r\n"), vec!["{\"a\":1}".to_string()]);

        let events = decoder.feed(b"event: message\ndata: first\ndata: second\n\ndata:x\n\n");
        assert_eq!(events, vec!["first\nsecond".to_string(), "x".to_string()]);
    }

    #[tokio::test]
    async fn test_follow_builds_board() {
        let body = concat!(
            ": connected\n\n",
            "data: {\"type\":\"trip_created\",\"trip\":{\"id\":1,\"latitude\":6.5,\"longitude\":3.4}}\n\n",
            "data: not json\n\n",
            "data: {\"type\":\"trip_created\",\"trip\":{\"id\":2}}\n\n",
            "data: {\"type\":\"trip_deleted\",\"tripId\":2}\n\n",
        );
        let (url, mut requests) =
            spawn_http_responder(http_response("200 OK", "text/event-stream", body)).await;
        let feed = TripFeed::new(trip_stream_url(&url)).unwrap();

        let mut sizes = Vec::new();
        let board = feed.follow(|board| sizes.push(board.len())).await.unwrap();

        assert_eq!(sizes, vec![1, 2, 1]);
        assert_eq!(board.trips()[0].id, RecordId::Number(1));
        let request = requests.recv().await.unwrap();
        assert!(request.head.starts_with("GET /admin/trips/stream "));
    }

    #[tokio::test]
    async fn test_follow_status_error() {
        let (url, _requests) =
            spawn_http_responder(http_response("404 Not Found", "text/plain", "")).await;
        let feed = TripFeed::new(trip_stream_url(&url)).unwrap();

        let result = feed.follow(|_| {}).await;
        assert!(matches!(result, Err(FeedError::Status(404))));
    }
}
