//! Dispatcher core module - hot path for request dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use may::sync::mpsc;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::handlers::{Handler, HandlerError, Next, Step};
use crate::middleware::Middleware;
use crate::router::{MethodRegistry, RouteMatch, SharedRegistry, Verb};
use crate::runtime_config::RuntimeConfig;
use crate::server::{status_reason, Body, HandlerRequest, ResponseBuilder};

/// How a handler chain ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The handler at `index` finalized the response
    Responded { index: usize },
    /// Every handler continued; the dispatcher finalized a default response
    Exhausted,
    /// A handler short-circuited. `handled` is true when an error stage
    /// finalized the response, false when the dispatcher synthesized one.
    Failed { handled: bool },
    /// A middleware answered before the chain ran
    Intercepted,
}

/// What the dispatcher does after one handler
enum Flow {
    Continue,
    Responded,
    Fail(HandlerError),
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Resolves requests against a routing table and drives the matched handler
/// chain to completion.
///
/// Handlers of one request run strictly one after another against a single
/// [`ResponseBuilder`]. A chain handler hands control on by invoking its
/// [`Next`]; until it does, the dispatcher parks on a channel receive (a
/// coroutine yields, a plain thread blocks). Distinct requests share nothing but
/// the read-only routing snapshot and may be dispatched concurrently.
///
/// Every matched request ends in a finalized response:
///
/// - a handler finalizes it ("first responder wins"; later handlers are skipped),
/// - the chain runs out, and an empty response is finalized,
/// - a handler fails, and the first error stage after it (or, failing that,
///   the dispatcher) produces the response.
///
/// Panics in handlers are caught and treated as failures.
#[derive(Clone)]
pub struct RequestDispatcher {
    registry: SharedRegistry,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: RuntimeConfig,
}

impl RequestDispatcher {
    /// Dispatcher over a fixed routing table with configuration from the environment
    #[must_use]
    pub fn new(registry: MethodRegistry) -> Self {
        Self::with_config(registry, RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_config(registry: impl Into<SharedRegistry>, config: RuntimeConfig) -> Self {
        let registry = registry.into();
        info!(
            routes_count = registry.load().route_count(),
            slow_match_us = config.slow_match_us,
            expose_errors = config.expose_errors,
            "Request dispatcher created"
        );
        Self {
            registry,
            middlewares: Vec::new(),
            config,
        }
    }

    /// Handle to the routing table; registrations through it are visible to
    /// the next dispatched request.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Add middleware; it runs in the order added
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Route lookup against the current snapshot
    #[must_use]
    pub fn lookup(&self, verb: Verb, path: &str) -> RouteMatch {
        let match_start = Instant::now();
        let route = self.registry.load().lookup(verb, path);
        let match_duration = match_start.elapsed();
        if match_duration > self.config.slow_match_threshold() {
            warn!(
                method = %verb,
                path = %path,
                duration_us = match_duration.as_micros(),
                threshold_us = self.config.slow_match_us,
                "Slow route matching detected"
            );
        }
        route
    }

    /// Dispatch `request` using its own verb and path.
    ///
    /// Returns `None` when no route matches; mapping that to a 404 is up to the
    /// caller. Otherwise returns the finalized response.
    #[must_use]
    pub fn dispatch(&self, mut request: HandlerRequest) -> Option<ResponseBuilder> {
        let route = self.lookup(request.method, &request.path);
        if route.is_not_found() {
            info!(
                request_id = %request.request_id,
                method = %request.method,
                path = %request.path,
                "No route matched"
            );
            return None;
        }

        request.path_params.extend(route.params.iter().cloned());

        let start = Instant::now();
        let (response, outcome) = match self.run_before(&request) {
            Some(early) => (early, ChainOutcome::Intercepted),
            None => self.run_chain(&route.handlers, &request),
        };
        let latency = start.elapsed();

        info!(
            request_id = %request.request_id,
            method = %request.method,
            path = %request.path,
            status = response.status_code(),
            outcome = ?outcome,
            latency_ms = latency.as_millis() as u64,
            "Handler chain complete"
        );

        for mw in &self.middlewares {
            mw.after(&request, &response, latency);
        }
        Some(response)
    }

    /// Dispatch with an explicit verb and path, overriding the descriptor's.
    #[must_use]
    pub fn dispatch_route(
        &self,
        verb: Verb,
        path: &str,
        mut request: HandlerRequest,
    ) -> Option<ResponseBuilder> {
        request.method = verb;
        path.clone_into(&mut request.path);
        self.dispatch(request)
    }

    fn run_before(&self, request: &HandlerRequest) -> Option<ResponseBuilder> {
        let mut early = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            let reply = mw.before(request);
            if early.is_some() {
                continue;
            }
            if let Some(reply) = reply {
                debug!(
                    request_id = %request.request_id,
                    middleware_idx = idx,
                    status = reply.status,
                    "Middleware returned early response"
                );
                let mut res = ResponseBuilder::new();
                early = Some(match res.apply_reply(reply) {
                    Ok(()) => res,
                    Err(e) => self.failure_response(&HandlerError::new(e.to_string())),
                });
            }
        }
        early
    }

    /// Run `handlers` in order against a fresh [`ResponseBuilder`].
    ///
    /// This is the chain-execution half of [`dispatch`](Self::dispatch), usable
    /// directly when the handler list comes from somewhere other than a lookup.
    #[must_use]
    pub fn run_chain(
        &self,
        handlers: &[Handler],
        request: &HandlerRequest,
    ) -> (ResponseBuilder, ChainOutcome) {
        let mut res = ResponseBuilder::new();

        for (index, handler) in handlers.iter().enumerate() {
            debug!(
                request_id = %request.request_id,
                handler_idx = index,
                handler_kind = handler.kind(),
                "Handler step"
            );
            let flow = match handler {
                Handler::ErrorStage(_) => continue,
                Handler::Terminal(f) => match catch_unwind(AssertUnwindSafe(|| f(request))) {
                    Ok(Ok(reply)) => match res.apply_reply(reply) {
                        Ok(()) => Flow::Responded,
                        Err(e) => Flow::Fail(HandlerError::new(e.to_string())),
                    },
                    Ok(Err(err)) => Flow::Fail(err),
                    Err(panic) => Flow::Fail(HandlerError::Panicked(panic_message(panic))),
                },
                Handler::Chain(f) => Self::run_chain_handler(f.as_ref(), index, request, &mut res),
            };

            match flow {
                Flow::Continue => {}
                Flow::Responded => return (res, ChainOutcome::Responded { index }),
                Flow::Fail(err) => return self.fail_chain(handlers, index, request, res, err),
            }
        }

        if let Err(e) = res.send(Body::Empty) {
            error!(
                request_id = %request.request_id,
                error = %e,
                "Failed to finalize default response"
            );
        }
        (res, ChainOutcome::Exhausted)
    }

    fn run_chain_handler(
        f: &crate::handlers::ChainFn,
        index: usize,
        request: &HandlerRequest,
        res: &mut ResponseBuilder,
    ) -> Flow {
        let (tx, rx) = mpsc::channel::<Step>();
        let next = Next::new(tx);

        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| f(request, res, next))) {
            return Flow::Fail(HandlerError::Panicked(panic_message(panic)));
        }
        if res.is_ready() {
            return Flow::Responded;
        }

        // The continuation may be invoked after the handler returned, from
        // another coroutine or thread; park until it is.
        match rx.recv() {
            Ok(Step::Continue) => Flow::Continue,
            Ok(Step::Fail(err)) => Flow::Fail(err),
            Err(_) => Flow::Fail(HandlerError::ContinuationDropped { index }),
        }
    }

    fn fail_chain(
        &self,
        handlers: &[Handler],
        failed_at: usize,
        request: &HandlerRequest,
        mut res: ResponseBuilder,
        err: HandlerError,
    ) -> (ResponseBuilder, ChainOutcome) {
        warn!(
            request_id = %request.request_id,
            handler_idx = failed_at,
            error = %err,
            "Handler chain short-circuited"
        );

        // A panicking handler may have finalized before it panicked.
        if res.is_ready() {
            return (res, ChainOutcome::Failed { handled: true });
        }

        let stage = handlers
            .iter()
            .enumerate()
            .skip(failed_at + 1)
            .find_map(|(idx, h)| match h {
                Handler::ErrorStage(f) => Some((idx, f)),
                _ => None,
            });

        if let Some((stage_idx, f)) = stage {
            match catch_unwind(AssertUnwindSafe(|| f(request, &mut res, &err))) {
                Ok(()) if res.is_ready() => {
                    debug!(
                        request_id = %request.request_id,
                        handler_idx = stage_idx,
                        status = res.status_code(),
                        "Error stage produced the response"
                    );
                    return (res, ChainOutcome::Failed { handled: true });
                }
                Ok(()) => warn!(
                    request_id = %request.request_id,
                    handler_idx = stage_idx,
                    "Error stage did not finalize the response"
                ),
                Err(panic) => error!(
                    request_id = %request.request_id,
                    handler_idx = stage_idx,
                    panic_message = %panic_message(panic),
                    "Error stage panicked"
                ),
            }
        }

        (
            self.failure_response(&err),
            ChainOutcome::Failed { handled: false },
        )
    }

    /// Generic failure response: the error's 4xx/5xx status when it carries
    /// one, 500 otherwise.
    fn failure_response(&self, err: &HandlerError) -> ResponseBuilder {
        let status = err
            .status()
            .filter(|s| (400..=599).contains(s))
            .unwrap_or(500);
        let reason = status_reason(status);
        let body = if self.config.expose_errors {
            json!({ "error": reason, "details": err.to_string() })
        } else {
            json!({ "error": reason })
        };

        let mut res = ResponseBuilder::new();
        if let Err(e) = res.status(status).and_then(|r| r.json(&body)) {
            error!(error = %e, "Failed to write synthesized failure response");
        }
        res
    }
}
