use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Connection tracking and management
///
/// Hands out at most `max_connections` guards at a time. Guards are owned,
/// so they can move into the task serving the connection.
#[derive(Debug)]
pub struct ConnectionTracker {
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
    connection_semaphore: Arc<Semaphore>,
    max_connections: usize,
}

impl ConnectionTracker {
    pub fn new(max_connections: usize) -> Self {
        Self {
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicU64::new(0),
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        }
    }

    /// Claims a connection slot without waiting; `None` when all are taken
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        let permit = Arc::clone(&self.connection_semaphore)
            .try_acquire_owned()
            .ok()?;

        let active = self.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        self.total_connections.fetch_add(1, Ordering::SeqCst);

        Some(ConnectionGuard {
            _permit: permit,
            tracker: Arc::clone(self),
            active,
            start_time: Instant::now(),
        })
    }

    /// Get current metrics
    pub fn metrics(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            active_connections: self.active_connections.load(Ordering::SeqCst),
            total_connections: self.total_connections.load(Ordering::SeqCst),
            available_slots: self.connection_semaphore.available_permits(),
            max_connections: self.max_connections,
        }
    }
}

/// RAII guard for connection tracking
pub struct ConnectionGuard {
    _permit: OwnedSemaphorePermit,
    tracker: Arc<ConnectionTracker>,
    active: usize,
    start_time: Instant,
}

impl ConnectionGuard {
    /// Active connections right after this one was admitted
    pub fn active(&self) -> usize {
        self.active
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self
            .tracker
            .active_connections
            .fetch_sub(1, Ordering::SeqCst)
            - 1;

        tracing::debug!(
            active_connections = active,
            total_connections = self.tracker.metrics().total_connections,
            connection_duration_ms = self.start_time.elapsed().as_millis() as u64,
            "Connection released"
        );
    }
}

/// Connection metrics for monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetrics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub available_slots: usize,
    pub max_connections: usize,
}

/// Size validator for request bodies
#[derive(Debug, Clone, Copy)]
pub struct SizeValidator {
    max_size: usize,
}

impl SizeValidator {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn validate_size(&self, size: usize) -> Result<(), SizeError> {
        if size > self.max_size {
            Err(SizeError::TooLarge {
                actual: size,
                max: self.max_size,
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    #[error("Request body too large: {actual} bytes, maximum allowed: {max} bytes")]
    TooLarge { actual: usize, max: usize },
}
