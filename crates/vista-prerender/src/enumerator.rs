//! Build-time URL enumeration and rendering.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::{stream, StreamExt, TryStreamExt};
use vista_core::{
    pathname_of, HookFailure, HookStage, PageContextPatch, PrerenderConfig, RenderError,
};
use vista_pipeline::{contain_hook, RenderOutcome, Renderer};

use crate::manifest::{PrerenderManifest, PrerenderedPage};

/// Identity of a URL as the router sees it: no query or hash, no trailing
/// slash except on the root.
fn url_key(url: &str) -> String {
    let path = pathname_of(url).trim_end_matches('/');
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// A URL scheduled for prerendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUrl {
    pub url: String,
    /// Page whose enumeration produced the URL (or the page itself for
    /// static routes added automatically).
    pub source_page: String,
    pub page_context: PageContextPatch,
}

/// Collects every prerenderable URL and renders it.
#[derive(Debug, Clone)]
pub struct PrerenderEnumerator {
    renderer: Arc<Renderer>,
    config: PrerenderConfig,
}

impl PrerenderEnumerator {
    pub fn new(renderer: Arc<Renderer>) -> Self {
        Self {
            renderer,
            config: PrerenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PrerenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PrerenderConfig {
        &self.config
    }

    /// Collect the URLs to prerender.
    ///
    /// Every enumeration hook runs exactly once. A URL produced twice is an
    /// error. Static pages without a hook are added unless already
    /// enumerated; parameterized pages that no enumerated URL reaches are
    /// skipped with a warning, or rejected when `partial` is off.
    pub async fn enumerate(&self) -> Result<Vec<PlannedUrl>, RenderError> {
        let resolver = self.renderer.resolver();
        let mut planned: Vec<PlannedUrl> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for page in resolver.pages() {
            let Some(hook) = page.prerender_hook() else {
                continue;
            };

            let entries = contain_hook(hook.enumerate()).await.map_err(|error| {
                RenderError::Hook(HookFailure {
                    page_id: page.id().to_string(),
                    stage: HookStage::Prerender,
                    error,
                })
            })?;
            tracing::debug!(page_id = page.id(), count = entries.len(), "enumerated URLs");

            for entry in entries {
                let key = url_key(&entry.url);
                if let Some(&i) = index.get(&key) {
                    return Err(RenderError::DuplicateUrl {
                        url: entry.url,
                        first: planned[i].source_page.clone(),
                        second: page.id().to_string(),
                    });
                }
                index.insert(key, planned.len());
                planned.push(PlannedUrl {
                    url: entry.url,
                    source_page: page.id().to_string(),
                    page_context: entry.page_context,
                });
            }
        }

        let covered: HashSet<String> = planned
            .iter()
            .filter_map(|p| resolver.resolve(&p.url).ok())
            .map(|m| m.page.id().to_string())
            .collect();

        for page in resolver.pages() {
            if page.prerender_hook().is_some() {
                continue;
            }
            let Some(entry) = resolver.entries().iter().find(|e| e.page().id() == page.id()) else {
                continue;
            };
            let pattern = entry.pattern();

            if pattern.is_static() {
                let key = url_key(pattern.as_str());
                if !index.contains_key(&key) {
                    index.insert(key, planned.len());
                    planned.push(PlannedUrl {
                        url: pattern.as_str().to_string(),
                        source_page: page.id().to_string(),
                        page_context: PageContextPatch::default(),
                    });
                }
            } else if !covered.contains(page.id()) {
                if !self.config.partial {
                    return Err(RenderError::Prerender {
                        url: pattern.as_str().to_string(),
                        reason: format!(
                            "page '{}' has route parameters but no prerender hook",
                            page.id()
                        ),
                    });
                }
                tracing::warn!(
                    page_id = page.id(),
                    route = pattern.as_str(),
                    "parameterized page has no prerender hook, skipping"
                );
            }
        }

        Ok(planned)
    }

    /// Enumerate, then render every URL.
    pub async fn run(&self) -> Result<PrerenderManifest, RenderError> {
        let start = Instant::now();
        let planned = self.enumerate().await?;
        let concurrency = self.config.concurrency.max(1);
        tracing::info!(urls = planned.len(), concurrency, "prerender started");

        let pages: Vec<PrerenderedPage> = stream::iter(planned)
            .map(|planned| self.render_one(planned))
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        let mut manifest = PrerenderManifest::new();
        for page in pages {
            manifest.insert(page);
        }

        tracing::info!(
            pages = manifest.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "prerender finished"
        );
        Ok(manifest)
    }

    async fn render_one(&self, planned: PlannedUrl) -> Result<PrerenderedPage, RenderError> {
        let PlannedUrl {
            url, page_context, ..
        } = planned;

        let mut ctx = match self.renderer.render_prerendered(&url, page_context).await {
            RenderOutcome::Rendered(ctx) => ctx,
            RenderOutcome::NotFound(_) => {
                return Err(RenderError::Prerender {
                    url,
                    reason: "no page matches the URL".to_string(),
                })
            }
            RenderOutcome::Failed { failure, .. } => {
                tracing::error!(url = %url, error = %failure, "prerender failed");
                return Err(RenderError::Hook(failure));
            }
        };

        let (status_code, html) = match ctx.http_response.take() {
            Some(response) => {
                let status = response.status_code;
                let bytes = response.body.collect().await.map_err(|e| RenderError::Prerender {
                    url: url.clone(),
                    reason: format!("response body failed: {e:#}"),
                })?;
                (Some(status), Some(String::from_utf8_lossy(&bytes).into_owned()))
            }
            None => (None, None),
        };

        tracing::debug!(url = %url, page_id = ctx.page_id.as_deref(), status = status_code, "prerendered");
        Ok(PrerenderedPage {
            page_id: ctx.page_id.clone().unwrap_or_default(),
            page_context: ctx.project(&self.config.serialized_keys),
            url,
            status_code,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use vista_core::{
        DataHook, HookError, Page, PageContext, PrerenderEntry, PrerenderHook, RenderHook,
        RenderOutput,
    };
    use vista_router::RouteResolver;

    use super::*;

    struct Entries(Vec<PrerenderEntry>);

    #[async_trait]
    impl PrerenderHook for Entries {
        async fn enumerate(&self) -> Result<Vec<PrerenderEntry>, HookError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEnumeration;

    #[async_trait]
    impl PrerenderHook for FailingEnumeration {
        async fn enumerate(&self) -> Result<Vec<PrerenderEntry>, HookError> {
            Err(HookError::msg("catalog offline"))
        }
    }

    struct CountingData(Arc<AtomicUsize>);

    #[async_trait]
    impl DataHook for CountingData {
        async fn data(&self, ctx: &PageContext) -> Result<PageContextPatch, HookError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(PageContextPatch::new().with_data(json!({"from": "hook", "url": ctx.url_original})))
        }
    }

    struct TitleHtml;

    #[async_trait]
    impl RenderHook for TitleHtml {
        async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
            let title = ctx.title.clone().unwrap_or_else(|| "untitled".into());
            Ok(RenderOutput::Html(format!("<h1>{title}</h1>")))
        }
    }

    fn movie_entry(id: u32) -> PrerenderEntry {
        PrerenderEntry::new(format!("/films/{id}")).with_page_context(
            PageContextPatch::new()
                .with_data(json!({"id": id}))
                .with_title(format!("Film {id}")),
        )
    }

    fn enumerator(pages: Vec<Page>) -> PrerenderEnumerator {
        let resolver = RouteResolver::from_pages(pages).unwrap();
        PrerenderEnumerator::new(Arc::new(Renderer::new(resolver)))
    }

    #[tokio::test]
    async fn test_enumerated_data_skips_data_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let enumerator = enumerator(vec![
            Page::new("film", "/films/:id")
                .with_data(CountingData(Arc::clone(&calls)))
                .with_render(TitleHtml)
                .with_prerender(Entries(vec![movie_entry(1), movie_entry(2)])),
        ]);

        let manifest = enumerator.run().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(manifest.len(), 2);
        let page = manifest.get("/films/2").unwrap();
        assert_eq!(page.page_id, "film");
        assert_eq!(page.status_code, Some(200));
        assert_eq!(page.html.as_deref(), Some("<h1>Film 2</h1>"));
        assert_eq!(page.page_context["data"], json!({"id": 2}));
        assert_eq!(page.page_context["routeParams"], json!({"id": "2"}));
        assert!(page.page_context.get("urlPathname").is_none());
    }

    #[tokio::test]
    async fn test_static_pages_added_automatically() {
        let calls = Arc::new(AtomicUsize::new(0));
        let enumerator = enumerator(vec![
            Page::new("about", "/about")
                .with_data(CountingData(Arc::clone(&calls)))
                .with_render(TitleHtml),
            Page::new("film", "/films/:id")
                .with_render(TitleHtml)
                .with_prerender(Entries(vec![movie_entry(1)])),
        ]);

        let planned = enumerator.enumerate().await.unwrap();
        let urls: Vec<&str> = planned.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/films/1", "/about"]);

        let manifest = enumerator.run().await.unwrap();
        assert_eq!(manifest.len(), 2);
        // Without enumerated data the data hook runs.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            manifest.get("/about").unwrap().page_context["data"]["from"],
            "hook"
        );
    }

    #[tokio::test]
    async fn test_hook_entry_for_static_url_is_kept() {
        let enumerator = enumerator(vec![
            Page::new("list", "/films").with_render(TitleHtml),
            Page::new("film", "/films/:id").with_prerender(Entries(vec![
                PrerenderEntry::new("/films")
                    .with_page_context(PageContextPatch::new().with_title("All films")),
                movie_entry(1),
            ])),
        ]);

        let planned = enumerator.enumerate().await.unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].source_page, "film");
        assert_eq!(planned[0].page_context.title.as_deref(), Some("All films"));
    }

    #[tokio::test]
    async fn test_duplicate_url_is_fatal() {
        let enumerator = enumerator(vec![
            Page::new("film", "/films/:id").with_prerender(Entries(vec![movie_entry(1)])),
            Page::new("list", "/films").with_prerender(Entries(vec![movie_entry(1)])),
        ]);

        match enumerator.run().await.unwrap_err() {
            RenderError::DuplicateUrl { url, first, second } => {
                assert_eq!(url, "/films/1");
                assert_eq!(first, "film");
                assert_eq!(second, "list");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_url_ignores_trailing_slash_and_query() {
        let across_pages = enumerator(vec![
            Page::new("film", "/films/:id").with_prerender(Entries(vec![movie_entry(1)])),
            Page::new("other", "/films")
                .with_prerender(Entries(vec![PrerenderEntry::new("/films/1/")])),
        ]);

        match across_pages.run().await.unwrap_err() {
            RenderError::DuplicateUrl { url, first, second } => {
                assert_eq!(url, "/films/1/");
                assert_eq!(first, "film");
                assert_eq!(second, "other");
            }
            other => panic!("unexpected error: {other}"),
        }

        let with_query = enumerator(vec![Page::new("film", "/films/:id").with_prerender(
            Entries(vec![movie_entry(2), PrerenderEntry::new("/films/2?ref=home")]),
        )]);
        assert!(matches!(
            with_query.enumerate().await,
            Err(RenderError::DuplicateUrl { ref url, .. }) if url == "/films/2?ref=home"
        ));
    }

    #[tokio::test]
    async fn test_static_page_with_trailing_slash_not_added_twice() {
        let enumerator = enumerator(vec![
            Page::new("about", "/about/").with_render(TitleHtml),
            Page::new("film", "/films/:id")
                .with_render(TitleHtml)
                .with_prerender(Entries(vec![PrerenderEntry::new("/about"), movie_entry(1)])),
        ]);

        let planned = enumerator.enumerate().await.unwrap();
        let urls: Vec<&str> = planned.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/about", "/films/1"]);
    }

    #[test]
    fn test_url_key() {
        assert_eq!(url_key("/films/1/"), "/films/1");
        assert_eq!(url_key("/films/1?x=1#top"), "/films/1");
        assert_eq!(url_key("/"), "/");
        assert_eq!(url_key("/?q"), "/");
    }

    #[tokio::test]
    async fn test_duplicate_within_one_hook_is_fatal() {
        let enumerator = enumerator(vec![Page::new("film", "/films/:id")
            .with_prerender(Entries(vec![movie_entry(3), movie_entry(3)]))]);

        assert!(matches!(
            enumerator.enumerate().await,
            Err(RenderError::DuplicateUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_uncovered_param_page() {
        let pages = || {
            vec![
                Page::new("home", "/").with_render(TitleHtml),
                Page::new("film", "/films/:id").with_render(TitleHtml),
            ]
        };

        let planned = enumerator(pages()).enumerate().await.unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].url, "/");

        let strict = enumerator(pages()).with_config(PrerenderConfig::default().with_partial(false));
        assert!(matches!(
            strict.enumerate().await,
            Err(RenderError::Prerender { ref url, .. }) if url == "/films/:id"
        ));
    }

    #[tokio::test]
    async fn test_enumeration_failure_names_page() {
        let enumerator = enumerator(vec![
            Page::new("film", "/films/:id").with_prerender(FailingEnumeration)
        ]);

        match enumerator.run().await.unwrap_err() {
            RenderError::Hook(failure) => {
                assert_eq!(failure.page_id, "film");
                assert_eq!(failure.stage, HookStage::Prerender);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unmatched_url_fails_build() {
        let enumerator = enumerator(vec![Page::new("film", "/films/:id")
            .with_prerender(Entries(vec![PrerenderEntry::new("/series/1")]))]);

        assert!(matches!(
            enumerator.run().await,
            Err(RenderError::Prerender { ref url, .. }) if url == "/series/1"
        ));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_renders() {
        let enumerator = enumerator(vec![Page::new("film", "/films/:id")
            .with_render(TitleHtml)
            .with_prerender(Entries((1..=5).map(movie_entry).collect()))])
        .with_config(PrerenderConfig::default().with_concurrency(0));

        assert_eq!(enumerator.run().await.unwrap().len(), 5);
    }
}
