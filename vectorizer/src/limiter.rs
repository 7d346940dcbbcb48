//! Bounded permit pool capping the number of inference calls in flight.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::EmbedError;

/// Fixed-capacity limiter shared by every request path.
///
/// Permits are scoped: [`ConcurrencyLimiter::acquire`] returns a [`Permit`] that gives its
/// capacity back when dropped, so every exit path (success, inference error, cancellation,
/// task abort) releases exactly once. A permit cannot be released without having been
/// acquired.
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Capacity token held around one inference call.
#[derive(Debug)]
#[must_use = "the permit is released as soon as it is dropped"]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

impl Permit {
    /// Releases the permit now. Equivalent to dropping it.
    pub fn release(self) {}
}

impl ConcurrencyLimiter {
    /// Creates a limiter with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Waits for a free permit.
    ///
    /// If `cancel` fires first, returns [`EmbedError::PermitAcquisitionCancelled`] without
    /// holding any capacity. Dropping the returned future is also safe: no permit is taken.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<Permit, EmbedError> {
        if cancel.is_cancelled() {
            return Err(EmbedError::PermitAcquisitionCancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EmbedError::PermitAcquisitionCancelled),
            permit = self.semaphore.clone().acquire_owned() => permit
                .map(|p| Permit { _permit: p })
                // The semaphore is never closed; treat it like a cancelled wait if it ever is.
                .map_err(|_| EmbedError::PermitAcquisitionCancelled),
        }
    }
}
