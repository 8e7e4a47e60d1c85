//! # Middleware Module
//!
//! Dispatcher-level observers wrapped around every dispatched request,
//! independent of which route matched. Per-route behaviour (authentication,
//! validation, ...) belongs in the route's handler chain instead.
//!
//! - [`TracingMiddleware`] - access log events per request
//! - [`MetricsMiddleware`] - request counts, latency and status classes

mod core;
mod metrics;
mod tracing;

pub use self::core::Middleware;
pub use self::metrics::MetricsMiddleware;
pub use self::tracing::TracingMiddleware;
