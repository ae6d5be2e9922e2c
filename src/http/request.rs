//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Convert the framework request into a plain [`IncomingRequest`]
//! - Buffer the body once so every reader sees the same bytes
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Headers become an ordered, case-insensitive list of strings
//! - The buffered body is reference counted; cloning never copies it

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Request};
use futures_util::StreamExt;
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::security::limits::declared_length_exceeds;

/// Name of the request id header.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request id for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request id of `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Ordered header mapping with case-insensitive lookup.
///
/// Repeated headers are folded into one entry, values joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, folding it into an existing entry of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy a framework header map. Values that are not valid UTF-8 are
    /// decoded lossily.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut list = Self::new();
        for (name, value) in headers {
            list.insert(
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        list
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderList
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (name, value) in iter {
            list.insert(name, value);
        }
        list
    }
}

/// Failure while reading the inbound body.
#[derive(Debug, thiserror::Error)]
pub enum BodyReadError {
    /// Declared or streamed length is over the limit.
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    /// The body stream failed (client disconnect, protocol error).
    #[error("failed to read request body: {0}")]
    Read(#[from] axum::Error),
}

/// A fully buffered inbound request, independent of the HTTP framework.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderList,
    pub body: Option<Bytes>,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Buffer a framework request, reading at most `limit` body bytes.
    /// An empty body is recorded as absent.
    pub async fn from_request(request: Request<Body>, limit: usize) -> Result<Self, BodyReadError> {
        let (parts, body) = request.into_parts();
        if declared_length_exceeds(&parts.headers, limit) {
            return Err(BodyReadError::TooLarge { limit });
        }
        let bytes = read_body(body, limit).await?;

        Ok(Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            headers: HeaderList::from_header_map(&parts.headers),
            body: (!bytes.is_empty()).then_some(bytes),
        })
    }
}

/// Collect `body`, failing as soon as more than `limit` bytes arrive.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, BodyReadError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(BodyReadError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buf))
}
