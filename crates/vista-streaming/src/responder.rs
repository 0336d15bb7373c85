//! SSR responder: the host-facing request handler.

use std::sync::Arc;

use futures::StreamExt;
use vista_core::{
    HttpResponse, PageContext, RenderError, ResponderPhase, ServerConfig,
};
use vista_observability::RenderMetrics;
use vista_pipeline::{PipelineOutcome, Renderer, RunOptions};

use crate::host::{ConnectionError, HostConnection, IncomingRequest};
use crate::sink::{ResponseSink, SinkError};

/// Why a request was handed back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassThroughReason {
    /// Something upstream already started the response.
    HeadersAlreadySent,
    /// The request carried no URL.
    MissingUrl,
    /// No page matches the URL.
    NotFound,
    /// A hook failed before anything was written.
    PipelineFailed,
    /// The pipeline completed without producing a response.
    NoResponse,
    /// The body failed before its first chunk was written.
    BodyFailed,
}

/// Result of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderOutcome {
    /// The full response was written.
    Responded {
        status_code: u16,
        bytes_written: usize,
    },
    /// The client disconnected mid-response. Streaming was stopped.
    ClientGone {
        status_code: u16,
        bytes_written: usize,
    },
    /// `next` was called; nothing was written.
    PassedThrough(PassThroughReason),
}

impl ResponderOutcome {
    pub fn phase(&self) -> ResponderPhase {
        match self {
            Self::Responded { .. } | Self::ClientGone { .. } => ResponderPhase::Responding,
            Self::PassedThrough(_) => ResponderPhase::PassThrough,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassedThrough(_))
    }
}

/// Handles requests by rendering pages onto a host connection.
///
/// Anything the responder cannot or should not answer is handed back to
/// the host through its `next` callback, leaving the connection untouched.
/// Errors are returned only when the response was already partially
/// written and cannot be recovered.
#[derive(Debug, Clone)]
pub struct SsrResponder {
    renderer: Arc<Renderer>,
    default_headers: Vec<(String, String)>,
}

impl SsrResponder {
    pub fn new(renderer: Arc<Renderer>) -> Self {
        Self {
            renderer,
            default_headers: Vec::new(),
        }
    }

    /// Apply server settings.
    pub fn with_config(mut self, config: &ServerConfig) -> Self {
        self.default_headers = config.default_headers.clone();
        self
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// Handle one request.
    pub async fn handle<C, F>(
        &self,
        request: IncomingRequest,
        conn: &mut C,
        next: F,
    ) -> Result<ResponderOutcome, RenderError>
    where
        C: HostConnection + ?Sized,
        F: FnOnce(),
    {
        if conn.headers_sent() {
            tracing::debug!(url = request.url.as_deref(), "headers already sent, passing through");
            return Ok(pass_through(next, PassThroughReason::HeadersAlreadySent));
        }
        let Some(init) = request.page_context_init() else {
            tracing::debug!("request has no URL, passing through");
            return Ok(pass_through(next, PassThroughReason::MissingUrl));
        };

        let url = init.url_original.clone();
        let ctx = PageContext::new(init);
        let mut metrics = RenderMetrics::new(ctx.request_id.clone(), &url);

        // Resolving
        let run = match self.renderer.resolve(ctx) {
            Ok(run) => run,
            Err(_) => {
                metrics.emit(ResponderPhase::PassThrough);
                return Ok(pass_through(next, PassThroughReason::NotFound));
            }
        };
        metrics.set_page(run.page.id());

        // PipelineRunning
        let mut ctx = match self.renderer.execute(run, RunOptions::default()).await {
            PipelineOutcome::Completed(ctx) => ctx,
            PipelineOutcome::Failed { ctx, failure } => {
                metrics.record_stages(&ctx.timing);
                tracing::error!(
                    request_id = %ctx.request_id,
                    url = %url,
                    page_id = %failure.page_id,
                    stage = %failure.stage,
                    error = %failure.error,
                    "page rendering failed"
                );
                metrics.emit(ResponderPhase::PassThrough);
                return Ok(pass_through(next, PassThroughReason::PipelineFailed));
            }
        };
        metrics.record_stages(&ctx.timing);

        let Some(response) = ctx.http_response.take() else {
            tracing::debug!(url = %url, page_id = ctx.page_id.as_deref(), "no response produced, passing through");
            metrics.emit(ResponderPhase::PassThrough);
            return Ok(pass_through(next, PassThroughReason::NoResponse));
        };

        // Responding
        let result = self.respond(&url, response, conn, &mut metrics).await;
        match &result {
            Ok(ResponderOutcome::PassedThrough(_)) => {
                metrics.emit(ResponderPhase::PassThrough);
            }
            Ok(_) => {
                metrics.emit(ResponderPhase::Responding);
            }
            Err(_) => {
                metrics.emit(ResponderPhase::Failed);
            }
        }
        match result {
            Ok(ResponderOutcome::PassedThrough(reason)) => Ok(pass_through(next, reason)),
            other => other,
        }
    }

    async fn respond<C>(
        &self,
        url: &str,
        response: HttpResponse,
        conn: &mut C,
        metrics: &mut RenderMetrics,
    ) -> Result<ResponderOutcome, RenderError>
    where
        C: HostConnection + ?Sized,
    {
        let HttpResponse {
            status_code,
            mut headers,
            body,
        } = response;

        for (name, value) in &self.default_headers {
            if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
                headers.push((name.clone(), value.clone()));
            }
        }

        metrics.record_status(status_code);
        let mut sink = ResponseSink::new(conn);
        sink.stage_head(status_code, headers)
            .map_err(|e| post_response(url, e))?;

        let mut stream = body.into_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) if !sink.is_flushed() => {
                    tracing::error!(url, error = %error, "response body failed before first chunk");
                    return Ok(ResponderOutcome::PassedThrough(PassThroughReason::BodyFailed));
                }
                Err(error) => {
                    tracing::error!(
                        url,
                        bytes_written = sink.bytes_written(),
                        error = %error,
                        "response body failed after headers were sent"
                    );
                    return Err(RenderError::PostResponse {
                        url: url.to_string(),
                        source: error,
                    });
                }
            };
            if chunk.is_empty() {
                continue;
            }

            let len = chunk.len();
            match sink.send_chunk(chunk).await {
                Ok(()) => metrics.record_bytes(len),
                Err(SinkError::Connection(ConnectionError::Closed)) => {
                    drop(stream);
                    tracing::info!(url, bytes_written = sink.bytes_written(), "client disconnected");
                    return Ok(ResponderOutcome::ClientGone {
                        status_code,
                        bytes_written: sink.bytes_written(),
                    });
                }
                Err(e) => return Err(post_response(url, e)),
            }
        }

        match sink.complete().await {
            Ok(()) => {}
            Err(SinkError::Connection(ConnectionError::Closed)) => {
                return Ok(ResponderOutcome::ClientGone {
                    status_code,
                    bytes_written: sink.bytes_written(),
                });
            }
            Err(e) => return Err(post_response(url, e)),
        }

        tracing::info!(url, status = status_code, bytes = sink.bytes_written(), "page rendered");
        Ok(ResponderOutcome::Responded {
            status_code,
            bytes_written: sink.bytes_written(),
        })
    }
}

fn pass_through<F: FnOnce()>(next: F, reason: PassThroughReason) -> ResponderOutcome {
    next();
    ResponderOutcome::PassedThrough(reason)
}

fn post_response(url: &str, error: SinkError) -> RenderError {
    RenderError::PostResponse {
        url: url.to_string(),
        source: error.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use async_trait::async_trait;
    use futures::stream::{self, Stream};
    use vista_core::{
        HookError, Page, RenderHook, RenderOutput, RequestHeaders,
        USER_AGENT_DEPRECATION,
    };
    use vista_router::RouteResolver;

    use super::*;
    use crate::host::MemoryConnection;

    struct Fixed(fn() -> Result<RenderOutput, HookError>);

    #[async_trait]
    impl RenderHook for Fixed {
        async fn render(&self, _ctx: &PageContext) -> Result<RenderOutput, HookError> {
            (self.0)()
        }
    }

    struct UserAgentEcho;

    #[async_trait]
    impl RenderHook for UserAgentEcho {
        async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
            #[allow(deprecated)]
            let ua = ctx.user_agent().unwrap_or("unknown").to_string();
            Ok(RenderOutput::Html(ua))
        }
    }

    /// Yields chunks forever and records when it is dropped.
    struct Endless {
        dropped: Arc<AtomicBool>,
    }

    impl Stream for Endless {
        type Item = anyhow::Result<Vec<u8>>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Ready(Some(Ok(b"chunk".to_vec())))
        }
    }

    impl Drop for Endless {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    fn responder(pages: Vec<Page>) -> SsrResponder {
        let resolver = RouteResolver::from_pages(pages).unwrap();
        SsrResponder::new(Arc::new(Renderer::new(resolver)))
    }

    fn html_page() -> Page {
        Page::new("home", "/").with_render(Fixed(|| {
            Ok(RenderOutput::Response(
                HttpResponse::new(200)
                    .with_header("content-type", "text/html")
                    .with_header("x-b", "2")
                    .with_header("x-a", "1")
                    .with_body("<h1>home</h1>"),
            ))
        }))
    }

    fn counting_next(counter: &AtomicUsize) -> impl FnOnce() + '_ {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_responds_with_headers_in_order() {
        let responder = responder(vec![html_page()])
            .with_config(&ServerConfig::default().with_default_header("x-powered-by", "vista"));
        let mut conn = MemoryConnection::new();
        let next_calls = AtomicUsize::new(0);

        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, counting_next(&next_calls))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ResponderOutcome::Responded {
                status_code: 200,
                bytes_written: 13
            }
        );
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
        let names: Vec<&str> = conn.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["content-type", "x-b", "x-a", "x-powered-by"]);
        assert_eq!(conn.body_text(), "<h1>home</h1>");
        assert!(conn.is_finished());
    }

    #[tokio::test]
    async fn test_page_header_beats_default_header() {
        let page = Page::new("home", "/").with_render(Fixed(|| {
            Ok(RenderOutput::Response(
                HttpResponse::text(200, "ok").with_header("X-Powered-By", "page"),
            ))
        }));
        let responder = responder(vec![page])
            .with_config(&ServerConfig::default().with_default_header("x-powered-by", "vista"));
        let mut conn = MemoryConnection::new();

        responder
            .handle(IncomingRequest::new("/"), &mut conn, || {})
            .await
            .unwrap();

        assert_eq!(conn.header("x-powered-by"), Some("page"));
        assert_eq!(conn.headers().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_passes_through_untouched() {
        let responder = responder(vec![html_page()]);
        let mut conn = MemoryConnection::new();
        let next_calls = AtomicUsize::new(0);

        let outcome = responder
            .handle(IncomingRequest::new("/star-trek"), &mut conn, counting_next(&next_calls))
            .await
            .unwrap();

        assert_eq!(outcome, ResponderOutcome::PassedThrough(PassThroughReason::NotFound));
        assert_eq!(outcome.phase(), ResponderPhase::PassThrough);
        assert_eq!(next_calls.load(Ordering::SeqCst), 1);
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_precondition_pass_through() {
        let responder = responder(vec![html_page()]);

        let mut conn = MemoryConnection::new();
        let outcome = responder
            .handle(IncomingRequest::default(), &mut conn, || {})
            .await
            .unwrap();
        assert_eq!(outcome, ResponderOutcome::PassedThrough(PassThroughReason::MissingUrl));

        let mut conn = MemoryConnection::new();
        conn.mark_headers_sent();
        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, || {})
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ResponderOutcome::PassedThrough(PassThroughReason::HeadersAlreadySent)
        );
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_page_without_response_passes_through() {
        let responder = responder(vec![Page::new("silent", "/")]);
        let mut conn = MemoryConnection::new();
        let next_calls = AtomicUsize::new(0);

        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, counting_next(&next_calls))
            .await
            .unwrap();

        assert_eq!(outcome, ResponderOutcome::PassedThrough(PassThroughReason::NoResponse));
        assert_eq!(next_calls.load(Ordering::SeqCst), 1);
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_pipeline_failure_passes_through() {
        let page = Page::new("broken", "/").with_render(Fixed(|| Err(HookError::msg("template missing"))));
        let responder = responder(vec![page]);
        let mut conn = MemoryConnection::new();
        let next_calls = AtomicUsize::new(0);

        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, counting_next(&next_calls))
            .await
            .unwrap();

        assert_eq!(outcome, ResponderOutcome::PassedThrough(PassThroughReason::PipelineFailed));
        assert_eq!(next_calls.load(Ordering::SeqCst), 1);
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_body_failure_after_headers_is_fatal() {
        let page = Page::new("stream", "/").with_render(Fixed(|| {
            let chunks = stream::iter(vec![
                Ok(b"<ul>".to_vec()),
                Err(anyhow::anyhow!("upstream reset")),
            ]);
            Ok(RenderOutput::Stream {
                content_type: "text/html".into(),
                body: Box::pin(chunks),
            })
        }));
        let responder = responder(vec![page]);
        let mut conn = MemoryConnection::new();
        let next_calls = AtomicUsize::new(0);

        let err = responder
            .handle(IncomingRequest::new("/"), &mut conn, counting_next(&next_calls))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::PostResponse { ref url, .. } if url == "/"));
        assert!(err.to_string().contains("upstream reset"));
        assert_eq!(next_calls.load(Ordering::SeqCst), 0);
        assert_eq!(conn.status(), Some(200));
        assert_eq!(conn.body_text(), "<ul>");
        assert!(!conn.is_finished());
    }

    #[tokio::test]
    async fn test_body_failure_before_first_chunk_passes_through() {
        let page = Page::new("stream", "/").with_render(Fixed(|| {
            let chunks = stream::iter(vec![Err(anyhow::anyhow!("no data"))]);
            Ok(RenderOutput::Stream {
                content_type: "text/html".into(),
                body: Box::pin(chunks),
            })
        }));
        let responder = responder(vec![page]);
        let mut conn = MemoryConnection::new();

        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, || {})
            .await
            .unwrap();

        assert_eq!(outcome, ResponderOutcome::PassedThrough(PassThroughReason::BodyFailed));
        assert!(conn.is_untouched());
    }

    #[tokio::test]
    async fn test_client_gone_stops_streaming() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dropped);
        let page = Page::new("live", "/").with_render(StreamOnce(std::sync::Mutex::new(Some(flag))));
        let responder = responder(vec![page]);
        let mut conn = MemoryConnection::closing_after(3);

        let outcome = responder
            .handle(IncomingRequest::new("/"), &mut conn, || {})
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ResponderOutcome::ClientGone {
                status_code: 200,
                bytes_written: 15
            }
        );
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(conn.chunks().len(), 3);
    }

    struct StreamOnce(std::sync::Mutex<Option<Arc<AtomicBool>>>);

    #[async_trait]
    impl RenderHook for StreamOnce {
        async fn render(&self, _ctx: &PageContext) -> Result<RenderOutput, HookError> {
            let dropped = self
                .0
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| HookError::msg("rendered twice"))?;
            Ok(RenderOutput::Stream {
                content_type: "text/plain".into(),
                body: Box::pin(Endless { dropped }),
            })
        }
    }

    #[tokio::test]
    async fn test_user_agent_deprecation_fires_once() {
        let responder = responder(vec![Page::new("ua", "/ua").with_render(UserAgentEcho)]);

        for _ in 0..3 {
            let request = IncomingRequest::new("/ua")
                .with_headers(RequestHeaders::from_pairs([("User-Agent", "curl/8.5")]));
            let mut conn = MemoryConnection::new();
            responder.handle(request, &mut conn, || {}).await.unwrap();
            assert_eq!(conn.body_text(), "curl/8.5");
        }

        assert!(USER_AGENT_DEPRECATION.has_fired());
        assert!(!USER_AGENT_DEPRECATION.fire());
    }
}
