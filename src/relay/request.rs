//! Inbound Request Model
//!
//! Framework-neutral view of a webhook delivery. Built once at the HTTP
//! boundary, after the body has been read to completion, and never mutated.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue, Method},
};
use futures_util::StreamExt;

use super::engine::RelayConfig;
use super::error::RelayError;
use super::message::EventPayload;

/// HTTP method as seen by the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMethod {
    /// Subscription validation probe
    Options,
    /// Event delivery
    Post,
    /// Anything else (GET, PUT, ...)
    Other(String),
}

impl From<&Method> for RequestMethod {
    fn from(method: &Method) -> Self {
        if method == Method::OPTIONS {
            RequestMethod::Options
        } else if method == Method::POST {
            RequestMethod::Post
        } else {
            RequestMethod::Other(method.as_str().to_string())
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestMethod::Options => write!(f, "OPTIONS"),
            RequestMethod::Post => write!(f, "POST"),
            RequestMethod::Other(m) => write!(f, "{}", m),
        }
    }
}

/// A fully received webhook request
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: RequestMethod,
    headers: HeaderMap,
    body: Bytes,
}

impl InboundRequest {
    /// Create a request from already-received parts
    pub fn new(method: RequestMethod, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            headers,
            body: body.into(),
        }
    }

    /// Empty OPTIONS request
    pub fn options() -> Self {
        Self::new(RequestMethod::Options, HeaderMap::new(), Bytes::new())
    }

    /// POST request carrying `body`
    pub fn post(body: impl Into<Bytes>) -> Self {
        Self::new(RequestMethod::Post, HeaderMap::new(), body)
    }

    /// Append a header value. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn method(&self) -> &RequestMethod {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of a header, looked up case-insensitively
    pub fn first_header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// The body as an opaque string. Invalid UTF-8 is replaced, never rejected.
    pub fn payload(&self) -> EventPayload {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Receive an axum request, reading the whole body under the configured
    /// size limit and read timeout.
    pub async fn from_http(request: Request, config: &RelayConfig) -> Result<Self, RelayError> {
        let (parts, body) = request.into_parts();
        let limit = config.max_body_size;

        if let Some(declared) = declared_length(&parts.headers) {
            if declared > limit {
                return Err(RelayError::BodyTooLarge { limit });
            }
        }

        let timeout = config.body_read_timeout();
        let body = tokio::time::timeout(timeout, collect_body(body, limit))
            .await
            .map_err(|_| RelayError::BodyReadTimeout(timeout))??;

        Ok(Self::new(
            RequestMethod::from(&parts.method),
            parts.headers,
            body,
        ))
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

async fn collect_body(body: Body, limit: usize) -> Result<Bytes, RelayError> {
    let mut stream = body.into_data_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RelayError::BodyRead(e.to_string()))?;
        if buffer.len() + chunk.len() > limit {
            return Err(RelayError::BodyTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}
