use std::sync::Arc;

use courier_geo::{coordinate::Coordinate, tracked_position::TrackedPosition};
use courier_providers::error::GeocodeError;
use tokio::{
    sync::{Mutex, mpsc, watch},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, info, warn};

use crate::{
    driver_state::{DriverState, next_state},
    navigator::Navigator,
    sink::{PositionSink, transmit_position},
    source::PositionSource,
    tracking::{AcquisitionMode, CancelHandle, TrackingError, start_tracking},
};

struct Running {
    handle: CancelHandle,
    worker: JoinHandle<()>,
}

/// Ties a position source to the sinks and the navigator for one shift.
///
/// Positions are handled in acquisition order. Each one replaces the driver
/// state, is sent to every sink concurrently and moves the navigator's
/// origin. A navigator still busy with the previous position skips the
/// update.
pub struct TrackingSession {
    source: Arc<dyn PositionSource>,
    mode: AcquisitionMode,
    sinks: Vec<Arc<PositionSink>>,
    navigator: Option<Arc<Mutex<Navigator>>>,
    state: watch::Sender<Option<DriverState>>,
    running: Option<Running>,
}

impl TrackingSession {
    pub fn new(source: Arc<dyn PositionSource>, mode: AcquisitionMode) -> Self {
        Self {
            source,
            mode,
            sinks: Vec::new(),
            navigator: None,
            state: watch::Sender::new(None),
            running: None,
        }
    }

    pub fn with_sink(mut self, sink: PositionSink) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn with_navigator(mut self, navigator: Navigator) -> Self {
        self.navigator = Some(Arc::new(Mutex::new(navigator)));
        self
    }

    pub async fn start(&mut self) -> Result<(), TrackingError> {
        if self.running.is_some() {
            return Ok(());
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = start_tracking(
            Arc::clone(&self.source),
            move |position| {
                let _ = sender.send(position);
            },
            self.mode,
        )
        .await?;

        let worker = tokio::spawn(handle_positions(
            receiver,
            self.sinks.clone(),
            self.state.clone(),
            self.navigator.clone(),
        ));

        info!("TrackingSession: started with {} sink(s)", self.sinks.len());
        self.running = Some(Running { handle, worker });

        Ok(())
    }

    /// Stops acquiring, abandons transmissions still in flight and drops
    /// the routing caches, also after the source stopped by itself.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.cancel();
            running.worker.abort();
            let _ = running.worker.await;
        }

        if let Some(navigator) = &self.navigator {
            navigator.lock().await.reset();
        }

        info!("TrackingSession: stopped");
    }

    /// Waits until the source stops by itself and every pending position
    /// was handled. Returns immediately when not running. Routing state is
    /// kept for read-outs.
    pub async fn finished(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.handle.stopped().await;
        if let Err(err) = running.worker.await {
            debug!("TrackingSession: worker ended: {}", err);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_stopped())
    }

    pub fn latest(&self) -> Option<DriverState> {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DriverState>> {
        self.state.subscribe()
    }

    pub fn navigator(&self) -> Option<Arc<Mutex<Navigator>>> {
        self.navigator.clone()
    }

    /// Routes from the latest known position to `address`.
    pub async fn set_destination(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let Some(navigator) = &self.navigator else {
            return Ok(None);
        };

        let mut navigator = navigator.lock().await;
        if let Some(state) = self.latest() {
            navigator.set_origin(state.position.coordinate);
        }

        navigator.set_destination(address).await.map(Some)
    }
}

async fn handle_positions(
    mut receiver: mpsc::UnboundedReceiver<TrackedPosition>,
    sinks: Vec<Arc<PositionSink>>,
    state: watch::Sender<Option<DriverState>>,
    navigator: Option<Arc<Mutex<Navigator>>>,
) {
    let mut transmits = JoinSet::new();
    let mut navigation = JoinSet::new();

    while let Some(position) = receiver.recv().await {
        let next = next_state(state.borrow().as_ref(), position);
        state.send_replace(Some(next));
        debug!(
            "TrackingSession: driver at {} heading {:.0}",
            position.coordinate, next.heading_degrees
        );

        for sink in &sinks {
            let sink = Arc::clone(sink);
            transmits.spawn(async move {
                if let Err(err) = transmit_position(&position, &sink).await {
                    warn!(
                        "TrackingSession: failed to send position to {}: {}",
                        sink.describe(),
                        err
                    );
                }
            });
        }

        if let Some(navigator) = &navigator {
            match Arc::clone(navigator).try_lock_owned() {
                Ok(mut navigator) => {
                    navigation.spawn(async move {
                        navigator.update_origin(position.coordinate).await;
                    });
                }
                Err(_) => debug!("TrackingSession: navigator busy, skipping origin update"),
            }
        }

        while transmits.try_join_next().is_some() {}
        while navigation.try_join_next().is_some() {}
    }

    while transmits.join_next().await.is_some() {}
    while navigation.join_next().await.is_some() {}
}
