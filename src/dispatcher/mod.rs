//! # Dispatcher Module
//!
//! Drives the handler chain of a matched route to a finalized response.
//!
//! ## Request Flow
//!
//! 1. The routing table resolves (verb, path) to a handler chain and captured
//!    parameters. No match means [`RequestDispatcher::dispatch`] returns `None`.
//! 2. Captured parameters are merged into the request's `path_params`.
//! 3. Middleware `before` hooks run; the first one that answers skips the chain.
//! 4. Handlers run in registration order against one shared
//!    [`ResponseBuilder`](crate::server::ResponseBuilder):
//!    - a terminal handler's reply finalizes the response,
//!    - a chain handler either finalizes the response or invokes its
//!      [`Next`](crate::handlers::Next), possibly later and from elsewhere,
//!    - error stages are skipped unless a handler before them fails.
//! 5. Middleware `after` hooks observe the finalized response.
//!
//! ## Error Handling
//!
//! - A handler that returns an error, fails its continuation, drops its
//!   continuation unused, or panics short-circuits the chain.
//! - The first error stage after the failing handler gets to write the response.
//! - Without one (or if it does not finalize), the dispatcher synthesizes a JSON
//!   failure response. Error text is included only when
//!   [`RuntimeConfig::expose_errors`](crate::runtime_config::RuntimeConfig) is set.

mod core;

pub use self::core::{ChainOutcome, RequestDispatcher};

#[cfg(test)]
mod tests;
