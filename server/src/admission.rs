//! Request admission control.
//!
//! At most `max_concurrent_requests` requests run at a time. Excess requests
//! wait on a FIFO semaphore with no queue bound and no timeout; callers see
//! only added latency, never a rejection.

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Clone, Debug)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl AdmissionLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot. `None` only if the semaphore was closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.semaphore).acquire_owned().await.ok()
    }
}

/// Hold an admission slot for the lifetime of the request.
pub async fn admission_middleware(
    State(limiter): State<AdmissionLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(_permit) = limiter.acquire().await else {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waits_when_full() {
        let limiter = AdmissionLimiter::new(1);
        let held = limiter.acquire().await.unwrap();
        assert_eq!(limiter.available(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err(), "second request must wait");

        drop(held);
        let admitted = tokio::time::timeout(Duration::from_secs(1), limiter.acquire()).await;
        assert!(admitted.unwrap().is_some());
    }

    #[test]
    fn test_zero_limit_still_admits() {
        let limiter = AdmissionLimiter::new(0);
        assert_eq!(limiter.limit(), 1);
        assert_eq!(limiter.available(), 1);
    }
}
