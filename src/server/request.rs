use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use smallvec::SmallVec;

use crate::ids::RequestId;
use crate::router::{ParamVec, Verb};

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because the same names (`content-type`,
/// `authorization`, ...) repeat across requests; lookups are case-insensitive.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request descriptor handed to every handler of a chain.
///
/// Built by the transport layer (which owns sockets, parsing and path
/// normalisation) and consumed by [`RequestDispatcher`](crate::dispatcher::RequestDispatcher).
/// The dispatcher fills `path_params` from the route match before the chain runs.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP verb
    pub method: Verb,
    /// Normalised request path, without query string
    pub path: String,
    /// URL as received, including the query string
    pub original_url: String,
    /// Request headers
    pub headers: HeaderVec,
    /// Query string parameters
    pub query_params: ParamVec,
    /// Path parameters captured by the route match
    pub path_params: ParamVec,
    /// Parsed JSON body, if the transport decoded one
    pub body: Option<Value>,
    /// Raw body bytes, if the transport kept them
    pub raw_body: Option<Vec<u8>>,
}

impl HandlerRequest {
    pub fn new(method: Verb, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            request_id: RequestId::new(),
            method,
            original_url: path.clone(),
            path,
            headers: HeaderVec::new(),
            query_params: ParamVec::new(),
            path_params: ParamVec::new(),
            body: None,
            raw_body: None,
        }
    }

    /// Build a descriptor from a request target such as `/users?limit=10&offset=20`.
    ///
    /// The part before `?` becomes `path`; the query string is URL-decoded into
    /// `query_params` in order of appearance.
    #[must_use]
    pub fn from_url(method: Verb, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (url, None),
        };
        let mut req = Self::new(method, path);
        req.original_url = url.to_string();
        if let Some(query) = query {
            req.query_params = url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                .collect();
        }
        req
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics when the same name was captured at
    /// several depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap.
    /// Note: This allocates - use get_path_param() in hot paths
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
