use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use courier_geo::{
    coordinate::Coordinate, route_result::RouteResult, tracked_position::TrackedPosition,
};
use courier_providers::{
    as_the_crow_flies::as_the_crow_flies_route,
    error::{GeocodeError, RouteError},
    geocoder::Geocoder,
    router::Router,
};
use futures::{
    FutureExt, StreamExt,
    future::BoxFuture,
    stream::{self, BoxStream},
};
use jiff::Timestamp;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};

use crate::source::{AcquireError, Permission, PositionSource};

pub fn coordinate(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

pub fn position(lat: f64, lng: f64, second: i64) -> TrackedPosition {
    TrackedPosition::new(
        coordinate(lat, lng),
        Timestamp::from_second(1_790_000_000 + second).unwrap(),
    )
}

/// A source whose positions are pushed by the test, so an acquisition can
/// be left pending.
pub struct ManualSource {
    permission: Permission,
    sender: mpsc::UnboundedSender<TrackedPosition>,
    receiver: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<TrackedPosition>>>,
    requests: AtomicUsize,
}

impl ManualSource {
    pub fn new(permission: Permission) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            permission,
            sender,
            receiver: Arc::new(tokio::sync::Mutex::new(receiver)),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, position: TrackedPosition) {
        self.sender.send(position).unwrap();
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PositionSource for ManualSource {
    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        futures::future::ready(self.permission).boxed()
    }

    fn current_position(&self) -> BoxFuture<'_, Result<TrackedPosition, AcquireError>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let receiver = Arc::clone(&self.receiver);
        async move { receiver.lock().await.recv().await.ok_or(AcquireError::Ended) }.boxed()
    }

    fn watch_positions(&self) -> BoxStream<'static, Result<TrackedPosition, AcquireError>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let receiver = Arc::clone(&self.receiver);
        stream::unfold(receiver, |receiver| async move {
            let next = receiver.lock().await.recv().await;
            next.map(|position| (Ok(position), receiver))
        })
        .boxed()
    }
}

#[derive(Default)]
pub struct CountingGeocoder {
    pub addresses: HashMap<String, Coordinate>,
    pub calls: AtomicUsize,
}

impl CountingGeocoder {
    pub fn with(addresses: &[(&str, Coordinate)]) -> Self {
        Self {
            addresses: addresses
                .iter()
                .map(|(address, coordinate)| (address.to_string(), *coordinate))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for CountingGeocoder {
    fn geocode<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<Coordinate, GeocodeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .addresses
            .get(address)
            .copied()
            .ok_or(GeocodeError::NotFound);
        futures::future::ready(result).boxed()
    }
}

#[derive(Default)]
pub struct CountingRouter {
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
}

impl CountingRouter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Router for CountingRouter {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<RouteResult, RouteError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(RouteError::Timeout)
        } else {
            Ok(as_the_crow_flies_route(origin, destination, 30.0))
        };
        futures::future::ready(result).boxed()
    }
}

pub struct RecordedRequest {
    pub head: String,
    pub body: String,
}

pub fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Answers every request with `response` and records what was received.
pub async fn spawn_http_responder(
    response: String,
) -> (String, mpsc::UnboundedReceiver<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (sender, receiver) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let sender = sender.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                let _ = sender.send(request);
            });
        }
    });

    (format!("http://{address}"), receiver)
}

async fn read_request(socket: &mut TcpStream) -> RecordedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let read = socket.read(&mut chunk).await.unwrap_or(0);
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        if let Some(end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buffer[..end]).to_string();
            let length = content_length(&head);
            let body_start = end + 4;

            if buffer.len() >= body_start + length {
                let body = String::from_utf8_lossy(&buffer[body_start..body_start + length]);
                return RecordedRequest {
                    head,
                    body: body.to_string(),
                };
            }
        }
    }

    RecordedRequest {
        head: String::from_utf8_lossy(&buffer).to_string(),
        body: String::new(),
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
