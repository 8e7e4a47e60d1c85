//! # acprouter
//!
//! **acprouter** is a method-aware path router with a sequential,
//! continuation-driven handler chain, built on the `may` coroutine runtime.
//!
//! ## Overview
//!
//! Routes are registered per HTTP verb as path patterns made of `/`-separated
//! segments:
//!
//! - `users` - a literal segment, matched exactly
//! - `:id` - a parameter, captures any one segment under the name `id`
//! - `*` - a wildcard, only meaningful as the root fallback route `/*`
//!
//! Each route holds an ordered chain of [`Handler`]s. The dispatcher runs the
//! chain against one shared [`ResponseBuilder`]: a handler either finalizes the
//! response or passes control on through its [`Next`](handlers::Next)
//! continuation, which it may invoke later from another coroutine or thread.
//! Failures skip ahead to the first error stage after the failing handler.
//!
//! ## Architecture
//!
//! - **[`router`]** - Per-verb segment tries and the [`MethodRegistry`]
//! - **[`handlers`]** - The handler variants and the continuation type
//! - **[`dispatcher`]** - Chain execution ([`RequestDispatcher`])
//! - **[`server`]** - Request descriptor and response builder
//! - **[`middleware`]** - Before/after hooks around dispatch (tracing, metrics)
//! - **[`runtime_config`]** - Environment-driven tuning
//! - **[`logging`]** - `tracing-subscriber` setup
//!
//! Transport is out of scope: the caller builds a [`HandlerRequest`] from
//! whatever wire format it serves and writes the finalized [`ResponseBuilder`]
//! back out.
//!
//! ## Quick Start
//!
//! ```rust
//! use acprouter::{Handler, HandlerError, HandlerRequest, MethodRegistry, RequestDispatcher, Verb};
//! use acprouter::runtime_config::RuntimeConfig;
//! use acprouter::server::HandlerResponse;
//!
//! let auth = Handler::chain(|req, _res, next| {
//!     if req.get_header("authorization").is_some() {
//!         next.proceed();
//!     } else {
//!         next.fail(HandlerError::with_status(401, "missing credentials"));
//!     }
//! });
//! let show = Handler::terminal(|req| {
//!     let id = req.get_path_param("id").unwrap_or_default();
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "id": id })))
//! });
//!
//! let mut registry = MethodRegistry::new();
//! registry.get("/users/:id", [auth, show]);
//! let dispatcher = RequestDispatcher::with_config(registry, RuntimeConfig::default());
//!
//! let req = HandlerRequest::new(Verb::Get, "/users/7").with_header("authorization", "token");
//! let res = dispatcher.dispatch(req).expect("route exists");
//! assert_eq!(res.status_code(), 200);
//!
//! let res = dispatcher
//!     .dispatch(HandlerRequest::new(Verb::Get, "/users/7"))
//!     .expect("route exists");
//! assert_eq!(res.status_code(), 401);
//! ```
//!
//! ## Concurrency
//!
//! A routing table is built before traffic starts and is read-only afterwards;
//! lookups never mutate it. To change routes while serving, go through
//! [`SharedRegistry`], which publishes a new table atomically.

pub mod dispatcher;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{ChainOutcome, RequestDispatcher};
pub use handlers::{Handler, HandlerError, Next};
pub use router::{MethodRegistry, RouteMatch, SharedRegistry, Verb};
pub use server::{HandlerRequest, ResponseBuilder};
