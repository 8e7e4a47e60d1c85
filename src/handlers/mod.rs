//! # Handlers Module
//!
//! Handler types bound to routes: the [`Handler`] tagged union, the [`Next`]
//! continuation a chain handler uses to pass control on, and the
//! [`HandlerError`] that short-circuits a chain.
//!
//! ## Example
//!
//! ```rust
//! use acprouter::handlers::{Handler, HandlerError};
//! use acprouter::server::HandlerResponse;
//!
//! // Middleware-style handler: reject requests without a token
//! let auth = Handler::chain(|req, _res, next| {
//!     if req.get_header("authorization").is_some() {
//!         next.proceed();
//!     } else {
//!         next.fail(HandlerError::with_status(401, "missing credentials"));
//!     }
//! });
//!
//! // Terminal handler: produce the reply
//! let show = Handler::terminal(|req| {
//!     Ok(HandlerResponse::json(200, serde_json::json!({ "id": req.get_path_param("id") })))
//! });
//! # let _ = (auth, show);
//! ```

mod types;

pub(crate) use types::Step;
pub use types::{ChainFn, ErrorStageFn, Handler, HandlerError, Next, TerminalFn};
