use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::Middleware;
use crate::dispatcher::{BoxedHandler, Handler, HandlerRequest, HandlerResponse};

/// Shared counters behind every handler a [`MetricsMiddleware`] wraps
#[derive(Debug, Default)]
struct Counters {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    /// Responses by status class, index 0 for 1xx through 4 for 5xx
    status_classes: [AtomicUsize; 5],
}

/// Middleware for collecting request metrics
///
/// Tracks request counts, latency and response status classes. All counters
/// use atomic operations for thread-safe updates without locks. Clones share
/// the same counters, so keep one clone to read what the chain recorded.
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.counters.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.counters.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of responses whose status falls in `class` (1 to 5, as in 2xx)
    #[must_use]
    pub fn status_class_count(&self, class: u16) -> usize {
        match class {
            1..=5 => self.counters.status_classes[usize::from(class - 1)].load(Ordering::Relaxed),
            _ => 0,
        }
    }
}

struct MeteredHandler {
    counters: Arc<Counters>,
    next: BoxedHandler,
}

impl Handler for MeteredHandler {
    fn serve(&self, req: &mut HandlerRequest, res: &mut HandlerResponse) {
        let start = Instant::now();
        self.next.serve(req, res);
        let latency = start.elapsed();

        self.counters.request_count.fetch_add(1, Ordering::Relaxed);
        self.counters
            .total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if (100..600).contains(&res.status) {
            let class = usize::from(res.status / 100 - 1);
            self.counters.status_classes[class].fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(MeteredHandler {
            counters: Arc::clone(&self.counters),
            next,
        })
    }
}
