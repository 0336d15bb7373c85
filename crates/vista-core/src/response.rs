//! HTTP response model produced by the pipeline.

use std::fmt;
use std::pin::Pin;

use futures::stream::{self, Stream, StreamExt};
use http::header::{CONTENT_TYPE, LOCATION};
use http::StatusCode;

/// A stream of body chunks. A chunk error aborts the response.
///
/// The stream must be `Sync` because it lives inside the page context that
/// hooks borrow across suspension points.
pub type BodyStream = Pin<Box<dyn Stream<Item = anyhow::Result<Vec<u8>>> + Send + Sync>>;

/// Response body.
pub enum Body {
    /// Fully buffered body.
    Full(Vec<u8>),
    /// Streamed body.
    Stream(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Self::Full(Vec::new())
    }

    /// Wrap a chunk stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = anyhow::Result<Vec<u8>>> + Send + Sync + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Turn the body into a chunk stream. A full body yields one chunk
    /// (or none when empty).
    pub fn into_stream(self) -> BodyStream {
        match self {
            Self::Full(bytes) if bytes.is_empty() => Box::pin(stream::empty()),
            Self::Full(bytes) => Box::pin(stream::iter(vec![Ok(bytes)])),
            Self::Stream(s) => s,
        }
    }

    /// Buffer the whole body.
    pub async fn collect(self) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut s) => {
                let mut out = Vec::new();
                while let Some(chunk) = s.next().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(out)
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Full(s.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Full(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Full(bytes)
    }
}

/// Response produced by a page.
#[derive(Debug)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status_code: u16,
    /// Headers in the order they must be written.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Body,
}

impl HttpResponse {
    /// Create an empty response with a status.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body: Body::empty(),
        }
    }

    /// 200 HTML response.
    pub fn html(html: impl Into<String>) -> Self {
        Self::new(200)
            .with_header(CONTENT_TYPE.as_str(), "text/html;charset=utf-8")
            .with_body(html.into())
    }

    /// 200 JSON response.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200)
            .with_header(CONTENT_TYPE.as_str(), "application/json")
            .with_body(value.to_string())
    }

    /// Plain-text response with an arbitrary status.
    pub fn text(status_code: u16, text: impl Into<String>) -> Self {
        Self::new(status_code)
            .with_header(CONTENT_TYPE.as_str(), "text/plain;charset=utf-8")
            .with_body(text.into())
    }

    /// Redirect response (302, or 301 when permanent).
    pub fn redirect(url: impl Into<String>, permanent: bool) -> Self {
        let status = if permanent {
            StatusCode::MOVED_PERMANENTLY
        } else {
            StatusCode::FOUND
        };
        Self::new(status.as_u16()).with_header(LOCATION.as_str(), url)
    }

    /// Append a header. Order is preserved.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Typed status, if the code is a valid HTTP status.
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }
}
