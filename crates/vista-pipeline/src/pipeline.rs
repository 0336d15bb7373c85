//! Hook pipeline.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use vista_core::{HookError, HookFailure, HookStage, Page, PageContext};

use crate::abort::abort_response;
use crate::stage::{StageFlow, PIPELINE_STAGES};

/// Per-run options chosen by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Do not invoke the data hook; the caller already supplied `data`.
    pub skip_data_hook: bool,
}

impl RunOptions {
    pub fn skip_data_hook(skip: bool) -> Self {
        Self {
            skip_data_hook: skip,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All stages ran (or a hook aborted with its own response).
    Completed(PageContext),
    /// A hook failed. The context holds whatever earlier stages produced.
    Failed {
        ctx: PageContext,
        failure: HookFailure,
    },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn page_context(&self) -> &PageContext {
        match self {
            Self::Completed(ctx) | Self::Failed { ctx, .. } => ctx,
        }
    }
}

/// Runs a page's hooks in order: guard, data, render.
///
/// Hook errors and panics are contained here and reported as
/// `PipelineOutcome::Failed`; they never unwind into the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookPipeline;

impl HookPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Run every stage for `page` against `ctx`.
    pub async fn run(&self, page: &Page, mut ctx: PageContext, options: RunOptions) -> PipelineOutcome {
        ctx.page_id = Some(page.id().to_string());

        for stage in PIPELINE_STAGES {
            ctx.timing.mark_stage_start(stage);
            let result = self.run_stage(page, &mut ctx, stage, options).await;
            ctx.timing.mark_stage_end(stage);

            let elapsed_us = ctx
                .timing
                .stage_timing(stage)
                .map(|t| t.duration.as_micros() as u64)
                .unwrap_or_default();

            match result {
                Ok(StageFlow::Continue) => {
                    tracing::debug!(page_id = page.id(), %stage, elapsed_us, "stage complete");
                }
                Ok(StageFlow::Halt) => {
                    tracing::debug!(page_id = page.id(), %stage, elapsed_us, "pipeline halted");
                    break;
                }
                Err(error) => {
                    return PipelineOutcome::Failed {
                        failure: HookFailure {
                            page_id: page.id().to_string(),
                            stage,
                            error,
                        },
                        ctx,
                    };
                }
            }
        }

        PipelineOutcome::Completed(ctx)
    }

    async fn run_stage(
        &self,
        page: &Page,
        ctx: &mut PageContext,
        stage: HookStage,
        options: RunOptions,
    ) -> Result<StageFlow, HookError> {
        let result = match stage {
            HookStage::Guard => match page.guard_hook() {
                Some(hook) => contain_hook(hook.guard(ctx)).await.map(|()| StageFlow::Continue),
                None => Ok(StageFlow::Continue),
            },
            HookStage::Data if options.skip_data_hook => {
                tracing::debug!(page_id = page.id(), "data pre-supplied, data hook skipped");
                Ok(StageFlow::Continue)
            }
            HookStage::Data => match page.data_hook() {
                Some(hook) => match contain_hook(hook.data(ctx)).await {
                    Ok(patch) => {
                        ctx.merge(patch);
                        Ok(StageFlow::Continue)
                    }
                    Err(err) => Err(err),
                },
                None => Ok(StageFlow::Continue),
            },
            HookStage::Render => match page.render_hook() {
                Some(hook) => match contain_hook(hook.render(ctx)).await {
                    Ok(output) => {
                        ctx.http_response = output.into_http_response();
                        Ok(StageFlow::Continue)
                    }
                    Err(err) => Err(err),
                },
                None => Ok(StageFlow::Continue),
            },
            HookStage::Prerender => Ok(StageFlow::Continue),
        };

        match result {
            Err(HookError::Abort(signal)) => {
                tracing::debug!(page_id = page.id(), %stage, %signal, "hook aborted the run");
                ctx.http_response = Some(abort_response(&signal));
                Ok(StageFlow::Halt)
            }
            other => other,
        }
    }
}

/// Await a hook, converting a panic into `HookError::Panicked`.
pub async fn contain_hook<T, F>(hook: F) -> Result<T, HookError>
where
    F: Future<Output = Result<T, HookError>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(HookError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;
    use vista_core::{
        DataHook, GuardHook, PageContextInit, PageContextPatch, RenderHook, RenderOutput,
    };

    use super::*;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct RecordingGuard(Log);

    #[async_trait]
    impl GuardHook for RecordingGuard {
        async fn guard(&self, _ctx: &PageContext) -> Result<(), HookError> {
            self.0.lock().unwrap().push("guard");
            Ok(())
        }
    }

    struct RecordingData {
        log: Log,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DataHook for RecordingData {
        async fn data(&self, _ctx: &PageContext) -> Result<PageContextPatch, HookError> {
            self.log.lock().unwrap().push("data");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PageContextPatch::new()
                .with_data(json!({"source": "hook"}))
                .with_title("From hook"))
        }
    }

    struct EchoRender(Log);

    #[async_trait]
    impl RenderHook for EchoRender {
        async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
            self.0.lock().unwrap().push("render");
            Ok(RenderOutput::Json(json!({
                "title": ctx.title,
                "data": ctx.data,
            })))
        }
    }

    struct FailingData;

    #[async_trait]
    impl DataHook for FailingData {
        async fn data(&self, _ctx: &PageContext) -> Result<PageContextPatch, HookError> {
            Err(HookError::msg("upstream timed out"))
        }
    }

    struct PanickingRender;

    #[async_trait]
    impl RenderHook for PanickingRender {
        async fn render(&self, _ctx: &PageContext) -> Result<RenderOutput, HookError> {
            panic!("template exploded");
        }
    }

    struct RedirectGuard;

    #[async_trait]
    impl GuardHook for RedirectGuard {
        async fn guard(&self, _ctx: &PageContext) -> Result<(), HookError> {
            Err(HookError::redirect("/login"))
        }
    }

    struct SkipRender;

    #[async_trait]
    impl RenderHook for SkipRender {
        async fn render(&self, _ctx: &PageContext) -> Result<RenderOutput, HookError> {
            Ok(RenderOutput::Skip)
        }
    }

    fn recording_page(log: &Log, calls: &Arc<AtomicUsize>) -> Page {
        Page::new("movies", "/star-wars")
            .with_guard(RecordingGuard(Arc::clone(log)))
            .with_data(RecordingData {
                log: Arc::clone(log),
                calls: Arc::clone(calls),
            })
            .with_render(EchoRender(Arc::clone(log)))
    }

    fn ctx() -> PageContext {
        PageContext::new(PageContextInit::new("/star-wars"))
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let log = Log::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let page = recording_page(&log, &calls);

        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;

        assert!(outcome.is_completed());
        assert_eq!(*log.lock().unwrap(), vec!["guard", "data", "render"]);
        let ctx = outcome.page_context();
        assert_eq!(ctx.page_id.as_deref(), Some("movies"));
        assert_eq!(ctx.title.as_deref(), Some("From hook"));
        assert_eq!(ctx.http_response.as_ref().unwrap().status_code, 200);
        assert!(ctx.timing.stage_timing(HookStage::Render).is_some());
    }

    #[tokio::test]
    async fn test_skip_data_hook_when_data_supplied() {
        let log = Log::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let page = recording_page(&log, &calls);

        let mut ctx = ctx();
        ctx.merge(PageContextPatch::new().with_data(json!({"source": "prerender"})));
        let outcome = HookPipeline::new()
            .run(&page, ctx, RunOptions::skip_data_hook(true))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(*log.lock().unwrap(), vec!["guard", "render"]);
        assert_eq!(
            outcome.page_context().data,
            Some(json!({"source": "prerender"}))
        );
    }

    #[tokio::test]
    async fn test_data_failure_is_contained() {
        let page = Page::new("movie", "/star-wars/:movieId")
            .with_data(FailingData)
            .with_render(SkipRender);

        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;

        match outcome {
            PipelineOutcome::Failed { failure, ctx } => {
                assert_eq!(failure.page_id, "movie");
                assert_eq!(failure.stage, HookStage::Data);
                assert!(failure.to_string().contains("upstream timed out"));
                assert!(ctx.http_response.is_none());
            }
            PipelineOutcome::Completed(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let page = Page::new("boom", "/boom").with_render(PanickingRender);

        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;

        match outcome {
            PipelineOutcome::Failed { failure, .. } => {
                assert_eq!(failure.stage, HookStage::Render);
                match failure.error {
                    HookError::Panicked(message) => assert_eq!(message, "template exploded"),
                    other => panic!("unexpected error: {other:?}"),
                }
            }
            PipelineOutcome::Completed(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_guard_redirect_halts_pipeline() {
        let log = Log::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let page = Page::new("account", "/account")
            .with_guard(RedirectGuard)
            .with_data(RecordingData {
                log: Arc::clone(&log),
                calls: Arc::clone(&calls),
            })
            .with_render(EchoRender(Arc::clone(&log)));

        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;

        assert!(outcome.is_completed());
        assert!(log.lock().unwrap().is_empty());
        let resp = outcome.page_context().http_response.as_ref().unwrap();
        assert_eq!(resp.status_code, 302);
        assert_eq!(resp.header("location"), Some("/login"));
    }

    #[tokio::test]
    async fn test_render_skip_leaves_no_response() {
        let page = Page::new("opt-out", "/opt-out").with_render(SkipRender);
        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;
        assert!(outcome.is_completed());
        assert!(outcome.page_context().http_response.is_none());
    }

    #[tokio::test]
    async fn test_page_without_hooks_completes_without_response() {
        let page = Page::new("empty", "/empty");
        let outcome = HookPipeline::new().run(&page, ctx(), RunOptions::default()).await;
        assert!(outcome.is_completed());
        assert!(outcome.page_context().http_response.is_none());
    }

    #[tokio::test]
    async fn test_contain_hook_passes_through_ok() {
        let value = contain_hook(async { Ok::<_, HookError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }
}
