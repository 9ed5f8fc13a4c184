use std::sync::atomic::{AtomicUsize, Ordering};

use courier_geo::tracked_position::TrackedPosition;
use futures::{
    FutureExt, StreamExt,
    future::BoxFuture,
    stream::{self, BoxStream},
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcquireError {
    /// No fix right now, the next tick may succeed.
    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("location permission was revoked")]
    PermissionRevoked,

    /// The source will never produce another position.
    #[error("position source ended")]
    Ended,
}

impl AcquireError {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AcquireError::Unavailable(_))
    }
}

/// The device location subsystem.
pub trait PositionSource: Send + Sync {
    fn request_permission(&self) -> BoxFuture<'_, Permission>;

    fn current_position(&self) -> BoxFuture<'_, Result<TrackedPosition, AcquireError>>;

    /// Continuous updates, ends when the subsystem stops reporting.
    fn watch_positions(&self) -> BoxStream<'static, Result<TrackedPosition, AcquireError>>;
}

/// Plays back a recorded list of positions.
pub struct ReplaySource {
    positions: Vec<TrackedPosition>,
    permission: Permission,
    next: AtomicUsize,
    acquisitions: AtomicUsize,
}

impl ReplaySource {
    pub fn new(positions: Vec<TrackedPosition>) -> Self {
        Self {
            positions,
            permission: Permission::Granted,
            next: AtomicUsize::new(0),
            acquisitions: AtomicUsize::new(0),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Number of times a position was requested.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl PositionSource for ReplaySource {
    fn request_permission(&self) -> BoxFuture<'_, Permission> {
        futures::future::ready(self.permission).boxed()
    }

    fn current_position(&self) -> BoxFuture<'_, Result<TrackedPosition, AcquireError>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        let result = self
            .positions
            .get(index)
            .copied()
            .ok_or(AcquireError::Ended);

        futures::future::ready(result).boxed()
    }

    fn watch_positions(&self) -> BoxStream<'static, Result<TrackedPosition, AcquireError>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        stream::iter(self.positions.clone().into_iter().map(Ok)).boxed()
    }
}
