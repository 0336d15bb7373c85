//! Page definitions and the hook traits page authors implement.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::{PageContext, PageContextPatch};
use crate::error::HookError;
use crate::response::{BodyStream, HttpResponse};

/// Pipeline stage a hook runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookStage {
    Guard,
    Data,
    Render,
    /// Build-time URL enumeration. Not part of the per-run pipeline.
    Prerender,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guard => "guard",
            Self::Data => "data",
            Self::Render => "render",
            Self::Prerender => "prerender",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs first; may abort the pipeline with a redirect or status.
#[async_trait]
pub trait GuardHook: Send + Sync {
    async fn guard(&self, ctx: &PageContext) -> Result<(), HookError>;
}

/// Loads data for a page. The returned patch is merged into the context.
#[async_trait]
pub trait DataHook: Send + Sync {
    async fn data(&self, ctx: &PageContext) -> Result<PageContextPatch, HookError>;
}

/// Turns the final page context into renderable output.
#[async_trait]
pub trait RenderHook: Send + Sync {
    async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError>;
}

/// Lists every URL a page can produce at build time.
#[async_trait]
pub trait PrerenderHook: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<PrerenderEntry>, HookError>;
}

/// Output of a render hook.
pub enum RenderOutput {
    /// HTML document, served as 200 `text/html`.
    Html(String),
    /// JSON document, served as 200 `application/json`.
    Json(Value),
    /// Streamed body with a content type, served as 200.
    Stream {
        content_type: String,
        body: BodyStream,
    },
    /// Fully custom response.
    Response(HttpResponse),
    /// The page opts out of producing a response.
    Skip,
}

impl RenderOutput {
    /// Convert into the response the responder writes. `Skip` yields `None`.
    pub fn into_http_response(self) -> Option<HttpResponse> {
        match self {
            Self::Html(html) => Some(HttpResponse::html(html)),
            Self::Json(value) => Some(HttpResponse::json(&value)),
            Self::Stream { content_type, body } => Some(
                HttpResponse::new(200)
                    .with_header(http::header::CONTENT_TYPE.as_str(), content_type)
                    .with_body(crate::response::Body::Stream(body)),
            ),
            Self::Response(resp) => Some(resp),
            Self::Skip => None,
        }
    }
}

impl fmt::Debug for RenderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html(html) => f.debug_tuple("Html").field(&html.len()).finish(),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Stream { content_type, .. } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .finish_non_exhaustive(),
            Self::Response(resp) => f.debug_tuple("Response").field(resp).finish(),
            Self::Skip => f.write_str("Skip"),
        }
    }
}

/// A declared static output: a URL plus pre-computed page context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrerenderEntry {
    pub url: String,
    #[serde(default)]
    pub page_context: PageContextPatch,
}

impl PrerenderEntry {
    /// Entry with no pre-computed context; the page's data hook will run.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_context: PageContextPatch::default(),
        }
    }

    pub fn with_page_context(mut self, patch: PageContextPatch) -> Self {
        self.page_context = patch;
        self
    }
}

/// A page: route pattern plus the hooks it provides.
///
/// Immutable once registered. Cloning shares the hooks.
#[derive(Clone)]
pub struct Page {
    id: String,
    route: String,
    guard: Option<Arc<dyn GuardHook>>,
    data: Option<Arc<dyn DataHook>>,
    render: Option<Arc<dyn RenderHook>>,
    prerender: Option<Arc<dyn PrerenderHook>>,
}

impl Page {
    /// Create a page with no hooks.
    pub fn new(id: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            route: route.into(),
            guard: None,
            data: None,
            render: None,
            prerender: None,
        }
    }

    pub fn with_guard(mut self, hook: impl GuardHook + 'static) -> Self {
        self.guard = Some(Arc::new(hook));
        self
    }

    pub fn with_data(mut self, hook: impl DataHook + 'static) -> Self {
        self.data = Some(Arc::new(hook));
        self
    }

    pub fn with_render(mut self, hook: impl RenderHook + 'static) -> Self {
        self.render = Some(Arc::new(hook));
        self
    }

    pub fn with_prerender(mut self, hook: impl PrerenderHook + 'static) -> Self {
        self.prerender = Some(Arc::new(hook));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Route pattern, e.g. `/star-wars/:movieId`.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn guard_hook(&self) -> Option<&dyn GuardHook> {
        self.guard.as_deref()
    }

    pub fn data_hook(&self) -> Option<&dyn DataHook> {
        self.data.as_deref()
    }

    pub fn render_hook(&self) -> Option<&dyn RenderHook> {
        self.render.as_deref()
    }

    pub fn prerender_hook(&self) -> Option<&dyn PrerenderHook> {
        self.prerender.as_deref()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("route", &self.route)
            .field("guard", &self.guard.is_some())
            .field("data", &self.data.is_some())
            .field("render", &self.render.is_some())
            .field("prerender", &self.prerender.is_some())
            .finish()
    }
}
