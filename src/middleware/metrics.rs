use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::server::{HandlerRequest, ResponseBuilder};

/// Request statistics kept in atomic counters, safe to share across
/// concurrently dispatched requests.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    success_count: AtomicUsize,
    client_error_count: AtomicUsize,
    server_error_count: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean processing time; zero before the first request
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        let total = self.total_latency_ns.load(Ordering::Relaxed);
        Duration::from_nanos(total.checked_div(count).unwrap_or(0))
    }

    /// Responses with a 2xx status
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.success_count.load(Ordering::Relaxed)
    }

    /// Responses with a 4xx status
    #[must_use]
    pub fn client_error_count(&self) -> usize {
        self.client_error_count.load(Ordering::Relaxed)
    }

    /// Responses with a 5xx status
    #[must_use]
    pub fn server_error_count(&self) -> usize {
        self.server_error_count.load(Ordering::Relaxed)
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, _req: &HandlerRequest, res: &ResponseBuilder, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        let counter = match res.status_code() {
            200..=299 => Some(&self.success_count),
            400..=499 => Some(&self.client_error_count),
            500..=599 => Some(&self.server_error_count),
            _ => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }
}
