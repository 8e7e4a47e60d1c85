use std::time::Duration;

use crate::server::{HandlerRequest, HandlerResponse, ResponseBuilder};

/// Hook run by the dispatcher around a matched request's handler chain.
///
/// Middleware runs in registration order. The first `before` returning a
/// response answers the request and the chain is skipped; every middleware's
/// `before` still runs. `after` sees the finalized response, which can no
/// longer be modified.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &ResponseBuilder, _latency: Duration) {}
}
