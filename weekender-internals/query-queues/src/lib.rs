//! Weekender Query Queues
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! weekender-internals/query-queues
//! A pacing queue that limits concurrency and request rate for external service calls.
//! Each submitted call is attempted exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, Notify, Semaphore};
use tokio::time::{self, Instant};

/// Error for the pacing queue
#[derive(Debug, Error)]
pub enum QueryQueueError {
    #[error("call failed: {0}")]
    Failed(#[source] anyhow::Error),
    #[error("queue is closed")]
    QueueClosed,
}

/// Rate limiting mode
#[derive(Clone, Debug, Default)]
enum RateLimit {
    #[default]
    ConcurrencyOnly,
    Qps {
        limit: u64,
        tokens: Arc<AtomicU64>,
        last_refill: Arc<Mutex<Instant>>,
        refill_interval: Duration,
        notify: Arc<Notify>,
    },
}

/// A work queue that bounds in-flight calls to an external service and
/// paces them to a queries-per-second budget.
///
/// # Examples
///
/// One call at a time, no pacing:
/// ```ignore
/// let queue = QueryQueue::with_concurrency_limit(1);
/// ```
///
/// One call at a time, at most 2 per second:
/// ```ignore
/// let queue = QueryQueue::with_qps_limit(1, 2);
/// ```
#[derive(Clone, Debug)]
pub struct QueryQueue {
    semaphore: Arc<Semaphore>,
    rate_limit: RateLimit,
}

impl Default for QueryQueue {
    fn default() -> Self {
        Self::with_concurrency_limit(1)
    }
}

impl QueryQueue {
    /// Create a queue allowing `max_concurrent` calls in flight
    pub fn with_concurrency_limit(max_concurrent: u64) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent as usize)),
            rate_limit: RateLimit::ConcurrencyOnly,
        }
    }

    /// Create a queue allowing `max_concurrent` calls in flight and at most
    /// `qps_limit` call starts per second
    pub fn with_qps_limit(max_concurrent: u64, qps_limit: u64) -> Self {
        let qps_limit = qps_limit.max(1);
        Self {
            rate_limit: RateLimit::Qps {
                limit: qps_limit,
                tokens: Arc::new(AtomicU64::new(qps_limit)),
                last_refill: Arc::new(Mutex::new(Instant::now())),
                refill_interval: Duration::from_secs(1),
                notify: Arc::new(Notify::new()),
            },
            ..Self::with_concurrency_limit(max_concurrent)
        }
    }

    /// Number of calls that may start right now without waiting on a permit
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Refill tokens based on elapsed time
    async fn refill_tokens(&self) {
        if let RateLimit::Qps {
            limit,
            tokens,
            last_refill,
            refill_interval,
            notify,
        } = &self.rate_limit
        {
            let mut last = last_refill.lock().await;
            let now = Instant::now();
            let elapsed = now.duration_since(*last);
            if elapsed >= *refill_interval {
                let new_tokens = (elapsed.as_secs_f64() * *limit as f64) as u64;
                if new_tokens > 0 {
                    let _ = tokens.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                        Some(cur.saturating_add(new_tokens).min(*limit))
                    });
                    notify.notify_waiters();
                }
                *last = now;
            }
        }
    }

    async fn acquire_token(&self) {
        let RateLimit::Qps { tokens, notify, .. } = &self.rate_limit else {
            return;
        };
        loop {
            self.refill_tokens().await;
            let available = tokens.load(Ordering::SeqCst);
            if available > 0 {
                if tokens
                    .compare_exchange(available, available - 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    return;
                }
            } else {
                let _ = time::timeout(Duration::from_millis(100), notify.notified()).await;
            }
        }
    }

    /// Run `f` once, after a concurrency permit and a rate token are available.
    ///
    /// A failed call is reported as [`QueryQueueError::Failed`]; it is never retried.
    pub async fn run<T, F, Fut>(&self, f: F) -> Result<T, QueryQueueError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, anyhow::Error>> + Send,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| QueryQueueError::QueueClosed)?;

        self.acquire_token().await;

        f().await.map_err(QueryQueueError::Failed)
    }

    /// Stop accepting calls. Waiting and future calls fail with [`QueryQueueError::QueueClosed`].
    pub fn close(&self) {
        self.semaphore.close();
    }
}
