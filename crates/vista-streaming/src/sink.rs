//! Head-first response writer.

use crate::host::{ConnectionError, HostConnection};

/// State of the response sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Nothing staged yet.
    Initial,
    /// Status and headers staged, not yet applied to the connection.
    HeadStaged,
    /// Head applied, body chunks may follow.
    HeadSent,
    /// Response finished.
    Completed,
}

/// Errors from the response sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("body written before status and headers were staged")]
    HeadNotStaged,

    #[error("head already staged")]
    HeadAlreadyStaged,

    #[error("sink already completed")]
    Completed,

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Writes a response to a host connection, head first.
///
/// Status and headers are staged and only applied to the connection when
/// the first body chunk is written or the response is completed, so a
/// failure before that point leaves the connection untouched.
pub struct ResponseSink<'a, C: HostConnection + ?Sized> {
    conn: &'a mut C,
    state: SinkState,
    status_code: u16,
    headers: Vec<(String, String)>,
    bytes_written: usize,
    chunks_written: usize,
}

impl<'a, C: HostConnection + ?Sized> ResponseSink<'a, C> {
    pub fn new(conn: &'a mut C) -> Self {
        Self {
            conn,
            state: SinkState::Initial,
            status_code: 200,
            headers: Vec::new(),
            bytes_written: 0,
            chunks_written: 0,
        }
    }

    /// Stage status and headers. Header order is preserved.
    pub fn stage_head(
        &mut self,
        status_code: u16,
        headers: Vec<(String, String)>,
    ) -> Result<(), SinkError> {
        if self.state != SinkState::Initial {
            return Err(SinkError::HeadAlreadyStaged);
        }
        self.status_code = status_code;
        self.headers = headers;
        self.state = SinkState::HeadStaged;
        Ok(())
    }

    /// Write one body chunk, flushing the head first if needed.
    pub async fn send_chunk(&mut self, chunk: Vec<u8>) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => return Err(SinkError::HeadNotStaged),
            SinkState::Completed => return Err(SinkError::Completed),
            SinkState::HeadStaged => self.flush_head()?,
            SinkState::HeadSent => {}
        }

        let len = chunk.len();
        self.conn.write_chunk(chunk).await?;
        self.bytes_written += len;
        self.chunks_written += 1;
        Ok(())
    }

    /// Finish the response.
    pub async fn complete(&mut self) -> Result<(), SinkError> {
        match self.state {
            SinkState::Initial => return Err(SinkError::HeadNotStaged),
            SinkState::Completed => return Err(SinkError::Completed),
            SinkState::HeadStaged => self.flush_head()?,
            SinkState::HeadSent => {}
        }

        self.conn.finish().await?;
        self.state = SinkState::Completed;
        Ok(())
    }

    /// Whether the head has reached the connection.
    pub fn is_flushed(&self) -> bool {
        matches!(self.state, SinkState::HeadSent | SinkState::Completed)
    }

    pub fn is_completed(&self) -> bool {
        self.state == SinkState::Completed
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }

    fn flush_head(&mut self) -> Result<(), SinkError> {
        self.conn.set_status(self.status_code)?;
        for (name, value) in &self.headers {
            self.conn.append_header(name, value)?;
        }
        self.state = SinkState::HeadSent;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryConnection;

    fn head() -> Vec<(String, String)> {
        vec![
            ("content-type".into(), "text/html;charset=utf-8".into()),
            ("cache-control".into(), "no-store".into()),
        ]
    }

    #[tokio::test]
    async fn test_head_applied_on_first_chunk() {
        let mut conn = MemoryConnection::new();
        {
            let mut sink = ResponseSink::new(&mut conn);
            sink.stage_head(200, head()).unwrap();
            assert!(!sink.is_flushed());

            sink.send_chunk(b"<html>".to_vec()).await.unwrap();
            sink.send_chunk(b"</html>".to_vec()).await.unwrap();
            sink.complete().await.unwrap();

            assert_eq!(sink.bytes_written(), 13);
            assert_eq!(sink.chunks_written(), 2);
        }

        assert_eq!(conn.status(), Some(200));
        assert_eq!(conn.headers(), head().as_slice());
        assert_eq!(conn.body_text(), "<html></html>");
        assert!(conn.is_finished());
    }

    #[tokio::test]
    async fn test_staged_head_leaves_connection_untouched() {
        let mut conn = MemoryConnection::new();
        {
            let mut sink = ResponseSink::new(&mut conn);
            sink.stage_head(404, head()).unwrap();
        }
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_empty_body_flushes_head_on_complete() {
        let mut conn = MemoryConnection::new();
        let mut sink = ResponseSink::new(&mut conn);
        sink.stage_head(302, vec![("location".into(), "/login".into())])
            .unwrap();
        sink.complete().await.unwrap();
        assert!(sink.is_completed());
        drop(sink);

        assert_eq!(conn.status(), Some(302));
        assert_eq!(conn.header("location"), Some("/login"));
        assert!(conn.chunks().is_empty());
    }

    #[tokio::test]
    async fn test_order_enforced() {
        let mut conn = MemoryConnection::new();
        let mut sink = ResponseSink::new(&mut conn);

        assert_eq!(
            sink.send_chunk(vec![1]).await,
            Err(SinkError::HeadNotStaged)
        );
        sink.stage_head(200, Vec::new()).unwrap();
        assert_eq!(
            sink.stage_head(200, Vec::new()),
            Err(SinkError::HeadAlreadyStaged)
        );
        sink.complete().await.unwrap();
        assert_eq!(sink.send_chunk(vec![1]).await, Err(SinkError::Completed));
    }

    #[tokio::test]
    async fn test_closed_connection_surfaces() {
        let mut conn = MemoryConnection::closing_after(0);
        let mut sink = ResponseSink::new(&mut conn);
        sink.stage_head(200, Vec::new()).unwrap();

        let err = sink.send_chunk(vec![1]).await.unwrap_err();
        assert_eq!(err, SinkError::Connection(ConnectionError::Closed));
    }
}
