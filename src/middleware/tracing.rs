use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::server::{HandlerRequest, HandlerResponse, ResponseBuilder};

/// Emits a structured event when a request enters and leaves the dispatcher.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            path_params = ?req.path_params,
            "Request received"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &ResponseBuilder, latency: Duration) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = res.status_code(),
            latency_ms = latency.as_millis() as u64,
            "Request completed"
        );
    }
}
