use std::fmt;
use std::sync::Arc;

use may::sync::mpsc;

use crate::server::{HandlerRequest, HandlerResponse, ResponseBuilder};

/// Function signature of a [`Handler::Terminal`] handler
pub type TerminalFn =
    dyn Fn(&HandlerRequest) -> Result<HandlerResponse, HandlerError> + Send + Sync + 'static;

/// Function signature of a [`Handler::Chain`] handler
pub type ChainFn = dyn Fn(&HandlerRequest, &mut ResponseBuilder, Next) + Send + Sync + 'static;

/// Function signature of a [`Handler::ErrorStage`] handler
pub type ErrorStageFn =
    dyn Fn(&HandlerRequest, &mut ResponseBuilder, &HandlerError) + Send + Sync + 'static;

/// One entry of a route's handler chain.
///
/// The dispatcher branches on the variant:
///
/// - `Terminal` produces a [`HandlerResponse`] which the dispatcher writes and
///   finalizes. Returning `Err` short-circuits the chain.
/// - `Chain` receives the shared [`ResponseBuilder`] and a [`Next`] continuation.
///   It either finalizes the builder (the chain ends there) or hands control on
///   through `next`.
/// - `ErrorStage` only runs after a short-circuit and is skipped otherwise.
///
/// Cloning a handler is cheap (the function is behind an `Arc`), and equality is
/// identity: two handlers are equal when they share the same allocation.
#[derive(Clone)]
pub enum Handler {
    Terminal(Arc<TerminalFn>),
    Chain(Arc<ChainFn>),
    ErrorStage(Arc<ErrorStageFn>),
}

impl Handler {
    pub fn terminal<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest) -> Result<HandlerResponse, HandlerError> + Send + Sync + 'static,
    {
        Handler::Terminal(Arc::new(f))
    }

    pub fn chain<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseBuilder, Next) + Send + Sync + 'static,
    {
        Handler::Chain(Arc::new(f))
    }

    pub fn on_error<F>(f: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseBuilder, &HandlerError) + Send + Sync + 'static,
    {
        Handler::ErrorStage(Arc::new(f))
    }

    /// Short label used in log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Handler::Terminal(_) => "terminal",
            Handler::Chain(_) => "chain",
            Handler::ErrorStage(_) => "error_stage",
        }
    }

    #[must_use]
    pub fn is_error_stage(&self) -> bool {
        matches!(self, Handler::ErrorStage(_))
    }

    fn addr(&self) -> *const () {
        match self {
            Handler::Terminal(f) => Arc::as_ptr(f).cast::<()>(),
            Handler::Chain(f) => Arc::as_ptr(f).cast::<()>(),
            Handler::ErrorStage(f) => Arc::as_ptr(f).cast::<()>(),
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{}({:p})", self.kind(), self.addr())
    }
}

/// Error handed to a continuation, short-circuiting the rest of the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// A handler reported a failure
    Failed {
        /// Human-readable reason
        message: String,
        /// Status the error stage may choose to honour
        status: Option<u16>,
    },
    /// A handler panicked; the payload is rendered to a string
    Panicked(String),
    /// A chain handler returned without finalizing and its continuation was dropped unused
    ContinuationDropped {
        /// Position of the handler in the chain
        index: usize,
    },
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Status code carried by the error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            HandlerError::Failed { status, .. } => *status,
            _ => None,
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Failed { message, .. } => f.write_str(message),
            HandlerError::Panicked(payload) => write!(f, "handler panicked: {payload}"),
            HandlerError::ContinuationDropped { index } => write!(
                f,
                "handler #{index} neither finalized the response nor invoked its continuation"
            ),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::new(message)
    }
}

/// Signal travelling from a continuation back to the dispatcher
#[derive(Debug)]
pub(crate) enum Step {
    Continue,
    Fail(HandlerError),
}

/// Continuation handed to a [`Handler::Chain`] handler.
///
/// Consuming `self` guarantees a continuation fires at most once. `Next` is
/// `Send + 'static`, so a handler may move it into another coroutine or thread
/// and invoke it once its asynchronous work is done; the dispatcher parks on a
/// channel until then.
#[derive(Debug)]
pub struct Next {
    tx: mpsc::Sender<Step>,
}

impl Next {
    pub(crate) fn new(tx: mpsc::Sender<Step>) -> Self {
        Self { tx }
    }

    /// Hand control to the next handler in the chain
    pub fn proceed(self) {
        self.signal(Step::Continue);
    }

    /// Short-circuit the chain with `err`
    pub fn fail(self, err: impl Into<HandlerError>) {
        self.signal(Step::Fail(err.into()));
    }

    /// `next()` / `next(err)` in one call
    pub fn call(self, err: Option<HandlerError>) {
        match err {
            Some(err) => self.fail(err),
            None => self.proceed(),
        }
    }

    fn signal(self, step: Step) {
        // The receiver is gone once the chain has already ended (for example the
        // handler finalized the response and then called next anyway).
        if self.tx.send(step).is_err() {
            tracing::debug!("continuation invoked after the chain ended");
        }
    }
}
