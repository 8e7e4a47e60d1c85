//! # Server Module
//!
//! Types exchanged with the transport layer. The transport parses the wire
//! request into a [`HandlerRequest`] and, once the dispatcher is done, transmits
//! the finalized [`ResponseBuilder`]. Sockets, TLS and HTTP parsing live outside
//! this crate.

pub mod request;
pub mod response;

pub use request::{HandlerRequest, HeaderVec, MAX_INLINE_HEADERS};
pub use response::{
    status_reason, Body, HandlerResponse, ResponseBuilder, ResponseError, ResponseOptions,
};
