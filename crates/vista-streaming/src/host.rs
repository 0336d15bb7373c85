//! Host boundary: the incoming request and the response handle.

use async_trait::async_trait;
use vista_core::{PageContextInit, RequestHeaders};

/// A request as handed over by the host server.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// Original URL. Some hosts hand over requests without one.
    pub url: Option<String>,
    pub headers: RequestHeaders,
}

impl IncomingRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            headers: RequestHeaders::default(),
        }
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Initial page context, or `None` when there is no usable URL.
    pub fn page_context_init(&self) -> Option<PageContextInit> {
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        Some(PageContextInit::new(url).with_headers(self.headers.clone()))
    }
}

/// Errors writing to a host connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The client went away.
    #[error("connection closed by client")]
    Closed,

    #[error("headers already sent")]
    HeadersSent,
}

/// The host's response handle.
///
/// Status and headers may be set until the first chunk is written or the
/// response is finished; after that `headers_sent` is true.
#[async_trait]
pub trait HostConnection: Send {
    fn headers_sent(&self) -> bool;

    fn set_status(&mut self, status_code: u16) -> Result<(), ConnectionError>;

    fn append_header(&mut self, name: &str, value: &str) -> Result<(), ConnectionError>;

    async fn write_chunk(&mut self, chunk: Vec<u8>) -> Result<(), ConnectionError>;

    async fn finish(&mut self) -> Result<(), ConnectionError>;
}

/// In-memory host connection, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    status_code: Option<u16>,
    headers: Vec<(String, String)>,
    chunks: Vec<Vec<u8>>,
    headers_sent: bool,
    finished: bool,
    close_after: Option<usize>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `chunks` body chunks, then report the client as gone.
    pub fn closing_after(chunks: usize) -> Self {
        Self {
            close_after: Some(chunks),
            ..Self::default()
        }
    }

    /// Pretend something upstream already started the response.
    pub fn mark_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    pub fn status(&self) -> Option<u16> {
        self.status_code
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn body(&self) -> Vec<u8> {
        self.chunks.concat()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Nothing was written: no status, headers or body.
    pub fn is_untouched(&self) -> bool {
        self.status_code.is_none()
            && self.headers.is_empty()
            && self.chunks.is_empty()
            && !self.finished
    }
}

#[async_trait]
impl HostConnection for MemoryConnection {
    fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    fn set_status(&mut self, status_code: u16) -> Result<(), ConnectionError> {
        if self.headers_sent {
            return Err(ConnectionError::HeadersSent);
        }
        self.status_code = Some(status_code);
        Ok(())
    }

    fn append_header(&mut self, name: &str, value: &str) -> Result<(), ConnectionError> {
        if self.headers_sent {
            return Err(ConnectionError::HeadersSent);
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: Vec<u8>) -> Result<(), ConnectionError> {
        if self.close_after.is_some_and(|limit| self.chunks.len() >= limit) {
            return Err(ConnectionError::Closed);
        }
        self.headers_sent = true;
        self.chunks.push(chunk);
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), ConnectionError> {
        self.headers_sent = true;
        self.finished = true;
        Ok(())
    }
}
