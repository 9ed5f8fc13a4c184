use std::{cell::Cell, sync::Arc, time::Duration};

use courier_geo::{distance::haversine_distance_meters, tracked_position::TrackedPosition};
use futures::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::source::{AcquireError, Permission, PositionSource};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackingError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("tracking interval must be greater than zero")]
    InvalidInterval,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquisitionMode {
    /// Ask for the current position every `interval`.
    Poll { interval: Duration },

    /// Follow the source's own updates, keeping only those at least
    /// `min_interval` newer and `min_distance_meters` away from the last
    /// delivered position.
    Watch {
        min_interval: Duration,
        min_distance_meters: f64,
    },
}

impl AcquisitionMode {
    pub fn poll_millis(interval_ms: u64) -> Self {
        AcquisitionMode::Poll {
            interval: Duration::from_millis(interval_ms),
        }
    }
}

/// Stop flag shared between the handle and the acquisition loop. The flag
/// is only read or written with the lock held, and the lock is held while
/// `on_update` runs, so once `stop` returns no callback is running or will
/// run. Reentrant so that `on_update` itself may cancel.
struct StopFlag {
    stopped: ReentrantMutex<Cell<bool>>,
    finished: watch::Sender<bool>,
}

impl StopFlag {
    fn new() -> Self {
        Self {
            stopped: ReentrantMutex::new(Cell::new(false)),
            finished: watch::Sender::new(false),
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.lock().get()
    }

    fn stop(&self) {
        self.stopped.lock().set(true);
        self.finished.send_replace(true);
    }

    /// Runs `deliver` unless stopped. Returns whether it ran.
    fn deliver_with(&self, deliver: impl FnOnce()) -> bool {
        let stopped = self.stopped.lock();
        if stopped.get() {
            return false;
        }

        deliver();
        true
    }
}

/// Stops a running acquisition loop. Cancelling is idempotent and also
/// happens when the handle is dropped.
pub struct CancelHandle {
    flag: Arc<StopFlag>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.stop();

        if let Some(task) = self.task.lock().take() {
            debug!("Tracking: cancelled");
            task.abort();
        }
    }

    /// True once cancelled or once the loop ended by itself.
    pub fn is_stopped(&self) -> bool {
        self.flag.is_stopped()
    }

    /// Waits until the loop is cancelled or ends by itself.
    pub async fn stopped(&self) {
        let mut finished = self.flag.finished.subscribe();
        let _ = finished.wait_for(|finished| *finished).await;
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Requests location permission, then starts delivering positions to
/// `on_update` in acquisition order until the returned handle is cancelled
/// or the source reports a terminal error.
///
/// Must be called within a tokio runtime.
pub async fn start_tracking<S, F>(
    source: Arc<S>,
    on_update: F,
    mode: AcquisitionMode,
) -> Result<CancelHandle, TrackingError>
where
    S: PositionSource + ?Sized + 'static,
    F: FnMut(TrackedPosition) + Send + 'static,
{
    if let AcquisitionMode::Poll { interval } = mode
        && interval.is_zero()
    {
        return Err(TrackingError::InvalidInterval);
    }

    if source.request_permission().await == Permission::Denied {
        warn!("Tracking: location permission denied");
        return Err(TrackingError::PermissionDenied);
    }

    let flag = Arc::new(StopFlag::new());
    let loop_flag = Arc::clone(&flag);

    let task = tokio::spawn(async move {
        match mode {
            AcquisitionMode::Poll { interval } => {
                poll_positions(&*source, on_update, interval, &loop_flag).await
            }
            AcquisitionMode::Watch {
                min_interval,
                min_distance_meters,
            } => {
                watch_positions(
                    &*source,
                    on_update,
                    min_interval,
                    min_distance_meters,
                    &loop_flag,
                )
                .await
            }
        }

        loop_flag.stop();
    });

    info!(?mode, "Tracking: started");

    Ok(CancelHandle {
        flag,
        task: Mutex::new(Some(task)),
    })
}

async fn poll_positions<S, F>(source: &S, mut on_update: F, period: Duration, flag: &StopFlag)
where
    S: PositionSource + ?Sized,
    F: FnMut(TrackedPosition),
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if flag.is_stopped() {
            return;
        }

        match source.current_position().await {
            Ok(position) => {
                if !flag.deliver_with(|| on_update(position)) {
                    return;
                }
            }
            Err(err) if err.is_terminal() => {
                warn!("Tracking: stopping, {}", err);
                return;
            }
            Err(err) => debug!("Tracking: skipping tick, {}", err),
        }
    }
}

async fn watch_positions<S, F>(
    source: &S,
    mut on_update: F,
    min_interval: Duration,
    min_distance_meters: f64,
    flag: &StopFlag,
) where
    S: PositionSource + ?Sized,
    F: FnMut(TrackedPosition),
{
    let mut positions = source.watch_positions();
    let mut last_delivered: Option<TrackedPosition> = None;

    while let Some(next) = positions.next().await {
        let position = match next {
            Ok(position) => position,
            Err(err) if err.is_terminal() => {
                warn!("Tracking: stopping, {}", err);
                return;
            }
            Err(err) => {
                debug!("Tracking: skipping update, {}", err);
                continue;
            }
        };

        if let Some(last) = &last_delivered
            && !passes_watch_filter(last, &position, min_interval, min_distance_meters)
        {
            continue;
        }

        if !flag.deliver_with(|| on_update(position)) {
            return;
        }
        last_delivered = Some(position);
    }

    debug!("Tracking: position stream ended");
}

fn passes_watch_filter(
    last: &TrackedPosition,
    next: &TrackedPosition,
    min_interval: Duration,
    min_distance_meters: f64,
) -> bool {
    let elapsed = next.captured_at.duration_since(last.captured_at);
    let moved = haversine_distance_meters(&last.coordinate, &next.coordinate);

    elapsed.as_secs_f64() >= min_interval.as_secs_f64() && moved >= min_distance_meters
}
