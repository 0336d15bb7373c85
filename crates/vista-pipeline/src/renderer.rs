//! Resolve-then-run entry point shared by SSR and prerendering.

use std::sync::Arc;

use vista_core::{HookFailure, Page, PageContext, PageContextInit, PageContextPatch};
use vista_router::RouteResolver;

use crate::pipeline::{HookPipeline, PipelineOutcome, RunOptions};

/// A page context whose URL matched a page.
#[derive(Debug)]
pub struct ResolvedRun {
    pub page: Arc<Page>,
    pub page_context: PageContext,
}

/// Result of rendering one URL.
#[derive(Debug)]
pub enum RenderOutcome {
    /// The pipeline completed. `http_response` may still be unset.
    Rendered(PageContext),
    /// No page matches the URL.
    NotFound(PageContext),
    /// A hook failed.
    Failed {
        ctx: PageContext,
        failure: HookFailure,
    },
}

impl RenderOutcome {
    pub fn page_context(&self) -> &PageContext {
        match self {
            Self::Rendered(ctx) | Self::NotFound(ctx) | Self::Failed { ctx, .. } => ctx,
        }
    }

    pub fn into_page_context(self) -> PageContext {
        match self {
            Self::Rendered(ctx) | Self::NotFound(ctx) | Self::Failed { ctx, .. } => ctx,
        }
    }
}

impl From<PipelineOutcome> for RenderOutcome {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Completed(ctx) => Self::Rendered(ctx),
            PipelineOutcome::Failed { ctx, failure } => Self::Failed { ctx, failure },
        }
    }
}

/// Matches URLs to pages and runs their hook pipeline.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    resolver: RouteResolver,
    pipeline: HookPipeline,
}

impl Renderer {
    pub fn new(resolver: RouteResolver) -> Self {
        Self {
            resolver,
            pipeline: HookPipeline::new(),
        }
    }

    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    /// Render a live request.
    pub async fn render(&self, init: PageContextInit) -> RenderOutcome {
        match self.resolve(PageContext::new(init)) {
            Ok(run) => self.execute(run, RunOptions::default()).await.into(),
            Err(ctx) => RenderOutcome::NotFound(ctx),
        }
    }

    /// Render a URL at build time.
    ///
    /// `patch` is merged before any hook runs. When it carries `data`, the
    /// page's data hook is not invoked.
    pub async fn render_prerendered(&self, url: &str, patch: PageContextPatch) -> RenderOutcome {
        let options = RunOptions::skip_data_hook(patch.has_data());
        let mut ctx = PageContext::new(PageContextInit::new(url));
        ctx.is_prerendering = true;
        ctx.merge(patch);

        match self.resolve(ctx) {
            Ok(run) => self.execute(run, options).await.into(),
            Err(ctx) => RenderOutcome::NotFound(ctx),
        }
    }

    /// Match the context's URL. On a miss the context is handed back.
    pub fn resolve(&self, mut ctx: PageContext) -> Result<ResolvedRun, PageContext> {
        match self.resolver.resolve(&ctx.url_original) {
            Ok(matched) => {
                ctx.route_params = matched.route_params;
                ctx.timing.mark("resolved");
                Ok(ResolvedRun {
                    page: matched.page,
                    page_context: ctx,
                })
            }
            Err(_) => Err(ctx),
        }
    }

    /// Run the pipeline for a resolved context.
    pub async fn execute(&self, run: ResolvedRun, options: RunOptions) -> PipelineOutcome {
        let ResolvedRun { page, page_context } = run;
        self.pipeline.run(&page, page_context, options).await
    }
}
