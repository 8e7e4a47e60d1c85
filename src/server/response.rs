use std::fmt;
use std::io::Read;
use std::sync::Arc;

use http::{HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::request::HeaderVec;

const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Canonical reason phrase for `status`, falling back to `"Unknown"`
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Reply produced by a [`Handler::Terminal`](crate::handlers::Handler::Terminal) handler.
///
/// The dispatcher writes it into the request's [`ResponseBuilder`]: a string body
/// is sent as text, `null` as an empty body, anything else as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, HeaderVec::new(), body)
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HeaderVec::new(), Value::String(body.into()))
    }

    /// Response without a body
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::new(status, HeaderVec::new(), Value::Null)
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Finalized response body.
pub enum Body {
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// Streamed body, read by the transport layer
    Stream(Box<dyn Read + Send>),
}

impl Body {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Bytes(b) => b.is_empty(),
            Body::Stream(_) => false,
        }
    }

    /// In-memory bytes of the body; `None` for streams
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[]),
            Body::Text(s) => Some(s.as_bytes()),
            Body::Bytes(b) => Some(b),
            Body::Stream(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Body::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(b)
    }
}

impl From<&[u8]> for Body {
    fn from(b: &[u8]) -> Self {
        Body::Bytes(b.to_vec())
    }
}

/// Partial response settings merged by [`ResponseBuilder::option`].
///
/// Present fields override the builder's values; headers are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseOptions {
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
}

/// Errors raised by [`ResponseBuilder`] mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// Header key or value is empty or not a legal HTTP token
    InvalidHeader {
        /// Offending header name
        key: String,
        /// Why it was rejected
        reason: &'static str,
    },
    /// Status code outside 100..=999
    InvalidStatus(u16),
    /// A terminal operation already ran; the response can no longer change
    AlreadyFinalized,
    /// The JSON body could not be serialized
    Json(String),
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseError::InvalidHeader { key, reason } => {
                write!(f, "invalid header '{key}': {reason}")
            }
            ResponseError::InvalidStatus(code) => write!(f, "invalid status code {code}"),
            ResponseError::AlreadyFinalized => {
                write!(f, "response already finalized; further writes are rejected")
            }
            ResponseError::Json(e) => write!(f, "failed to encode JSON body: {e}"),
        }
    }
}

impl std::error::Error for ResponseError {}

fn validate_header(key: &str, value: &str) -> Result<(), ResponseError> {
    let invalid = |reason| ResponseError::InvalidHeader {
        key: key.to_string(),
        reason,
    };
    if key.is_empty() || value.is_empty() {
        return Err(invalid("header key or value is not defined"));
    }
    HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid("illegal header name"))?;
    HeaderValue::from_str(value).map_err(|_| invalid("illegal header value"))?;
    Ok(())
}

/// Mutable response accumulator shared by the handlers of one request.
///
/// Exactly one terminal operation ([`send`](Self::send), [`json`](Self::json),
/// [`send_stream`](Self::send_stream)) finalizes the builder. Once finalized,
/// every mutation fails with [`ResponseError::AlreadyFinalized`] and leaves the
/// builder untouched; the transport consumes the result with
/// [`into_body`](Self::into_body) and the accessors.
///
/// ```rust
/// use acprouter::server::{ResponseBuilder, ResponseError};
///
/// let mut res = ResponseBuilder::new();
/// res.status(201)?.set_header("x-trace", "abc")?;
/// res.json(&serde_json::json!({ "id": 7 }))?;
/// assert!(res.is_ready());
/// assert_eq!(res.status(500).unwrap_err(), ResponseError::AlreadyFinalized);
/// # Ok::<(), ResponseError>(())
/// ```
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<u16>,
    status_text: Option<String>,
    headers: HeaderVec,
    finalized: bool,
    body: Option<Body>,
}

impl ResponseBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), ResponseError> {
        if self.finalized {
            warn!(
                status = self.status_code(),
                "write attempted on a finalized response"
            );
            return Err(ResponseError::AlreadyFinalized);
        }
        Ok(())
    }

    fn check_status(code: u16) -> Result<(), ResponseError> {
        StatusCode::from_u16(code)
            .map(|_| ())
            .map_err(|_| ResponseError::InvalidStatus(code))
    }

    fn put_header(&mut self, key: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((Arc::from(key), value.to_string())),
        }
    }

    pub fn status(&mut self, code: u16) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        Self::check_status(code)?;
        self.status = Some(code);
        Ok(self)
    }

    pub fn status_text(&mut self, text: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        self.status_text = Some(text.to_string());
        Ok(self)
    }

    /// Merge `options` into the builder. Validation happens before anything is
    /// applied, so a rejected call changes nothing.
    pub fn option(&mut self, options: ResponseOptions) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        if let Some(code) = options.status {
            Self::check_status(code)?;
        }
        for (k, v) in &options.headers {
            validate_header(k, v)?;
        }
        if let Some(code) = options.status {
            self.status = Some(code);
        }
        if let Some(text) = options.status_text {
            self.status_text = Some(text);
        }
        for (k, v) in &options.headers {
            self.put_header(k, v);
        }
        Ok(self)
    }

    /// Replace the whole header set
    pub fn headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self, ResponseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.ensure_open()?;
        let mut replacement = HeaderVec::new();
        for (k, v) in headers {
            let (k, v) = (k.as_ref(), v.as_ref());
            validate_header(k, v)?;
            replacement.retain(|(existing, _)| !existing.eq_ignore_ascii_case(k));
            replacement.push((Arc::from(k), v.to_string()));
        }
        self.headers = replacement;
        Ok(self)
    }

    /// Set one header, replacing any existing value under the same
    /// (case-insensitive) name.
    ///
    /// # Errors
    ///
    /// [`ResponseError::InvalidHeader`] when `key` or `value` is empty or illegal;
    /// the header set is left unchanged.
    pub fn set_header(&mut self, key: &str, value: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        validate_header(key, value)?;
        self.put_header(key, value);
        Ok(self)
    }

    #[must_use]
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn header_map(&self) -> &[(Arc<str>, String)] {
        &self.headers
    }

    /// Finalize with a raw body. Text bodies get a `text/plain` content type
    /// unless one was set.
    pub fn send(&mut self, body: impl Into<Body>) -> Result<(), ResponseError> {
        self.ensure_open()?;
        let body = body.into();
        if matches!(body, Body::Text(_)) && self.get_header("content-type").is_none() {
            self.put_header("content-type", TEXT_CONTENT_TYPE);
        }
        self.finish(body);
        Ok(())
    }

    /// Finalize with a JSON-encoded body
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), ResponseError> {
        self.ensure_open()?;
        let bytes = serde_json::to_vec(body).map_err(|e| ResponseError::Json(e.to_string()))?;
        if self.get_header("content-type").is_none() {
            self.put_header("content-type", JSON_CONTENT_TYPE);
        }
        self.finish(Body::Bytes(bytes));
        Ok(())
    }

    /// Finalize with a body the transport will stream from `reader`
    pub fn send_stream<R>(&mut self, reader: R) -> Result<(), ResponseError>
    where
        R: Read + Send + 'static,
    {
        self.ensure_open()?;
        self.finish(Body::Stream(Box::new(reader)));
        Ok(())
    }

    fn finish(&mut self, body: Body) {
        self.body = Some(body);
        self.finalized = true;
    }

    /// Write a terminal handler's reply and finalize
    pub(crate) fn apply_reply(&mut self, reply: HandlerResponse) -> Result<(), ResponseError> {
        self.ensure_open()?;
        Self::check_status(reply.status)?;
        for (k, v) in &reply.headers {
            validate_header(k, v)?;
        }
        self.status = Some(reply.status);
        for (k, v) in &reply.headers {
            self.put_header(k, v);
        }
        match reply.body {
            Value::Null => self.send(Body::Empty),
            Value::String(s) => self.send(Body::Text(s)),
            other => self.json(&other),
        }
    }

    /// Whether a terminal operation has run
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.finalized
    }

    /// Status to transmit; 200 when no handler set one
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    /// Status text to transmit: the explicit one, else the canonical reason
    #[must_use]
    pub fn status_reason(&self) -> &str {
        self.status_text
            .as_deref()
            .unwrap_or_else(|| status_reason(self.status_code()))
    }

    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Consume the builder, yielding the finalized body
    #[must_use]
    pub fn into_body(self) -> Option<Body> {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut res = ResponseBuilder::new();
        res.set_header("Content-Type", "text/html").unwrap();
        res.set_header("content-type", "application/json").unwrap();
        assert_eq!(res.header_map().len(), 1);
        assert_eq!(res.get_header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn test_illegal_header_name_rejected() {
        let mut res = ResponseBuilder::new();
        let err = res.set_header("bad header", "v").unwrap_err();
        assert!(matches!(err, ResponseError::InvalidHeader { .. }));
        assert!(res.header_map().is_empty());
    }

    #[test]
    fn test_option_is_atomic() {
        let mut res = ResponseBuilder::new();
        let opts = ResponseOptions {
            status: Some(201),
            status_text: None,
            headers: vec![("x-ok".into(), "1".into()), ("".into(), "v".into())],
        };
        assert!(res.option(opts).is_err());
        assert_eq!(res.status_code(), 200);
        assert!(res.header_map().is_empty());
    }

    #[test]
    fn test_apply_reply_string_is_text() {
        let mut res = ResponseBuilder::new();
        res.apply_reply(HandlerResponse::text(202, "queued"))
            .unwrap();
        assert_eq!(res.status_code(), 202);
        assert_eq!(res.get_header("content-type"), Some(TEXT_CONTENT_TYPE));
        assert_eq!(res.body().and_then(Body::as_bytes), Some(&b"queued"[..]));
    }

    #[test]
    fn test_apply_reply_null_is_empty() {
        let mut res = ResponseBuilder::new();
        res.apply_reply(HandlerResponse::empty(204)).unwrap();
        assert!(res.body().is_some_and(Body::is_empty));
        assert_eq!(res.get_header("content-type"), None);
    }
}
