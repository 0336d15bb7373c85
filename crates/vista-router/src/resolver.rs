//! URL to page resolution.

use std::sync::Arc;

use vista_core::{pathname_of, Page, RouteNotFound, RouteParams};

use crate::pattern::{RouteError, RoutePattern};

/// A registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    page: Arc<Page>,
}

impl RouteEntry {
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }
}

/// Result of a successful resolution.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub page: Arc<Page>,
    pub route_params: RouteParams,
}

/// Maps URLs to pages.
///
/// Entries are kept sorted by specificity; the stable sort keeps
/// registration order among equally specific routes.
#[derive(Debug, Clone, Default)]
pub struct RouteResolver {
    entries: Vec<RouteEntry>,
    registration: Vec<Arc<Page>>,
}

impl RouteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from pages, in registration order.
    pub fn from_pages(pages: impl IntoIterator<Item = Page>) -> Result<Self, RouteError> {
        let mut resolver = Self::new();
        for page in pages {
            resolver.register(page)?;
        }
        Ok(resolver)
    }

    /// Register a page.
    pub fn register(&mut self, page: Page) -> Result<(), RouteError> {
        if self.registration.iter().any(|p| p.id() == page.id()) {
            return Err(RouteError::DuplicatePage(page.id().to_string()));
        }

        let pattern = RoutePattern::parse(page.route())?;
        let page = Arc::new(page);
        self.registration.push(Arc::clone(&page));
        self.entries.push(RouteEntry { pattern, page });
        self.entries.sort_by_key(|e| e.pattern.specificity());
        Ok(())
    }

    /// Pages in registration order.
    pub fn pages(&self) -> impl Iterator<Item = &Arc<Page>> {
        self.registration.iter()
    }

    /// Routes in precedence order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Look up a page by id.
    pub fn page(&self, id: &str) -> Option<&Arc<Page>> {
        self.registration.iter().find(|p| p.id() == id)
    }

    /// Resolve a URL to the most specific matching page.
    pub fn resolve(&self, url: &str) -> Result<RouteMatch, RouteNotFound> {
        let pathname = pathname_of(url);

        for entry in &self.entries {
            if let Some(route_params) = entry.pattern.matches(pathname) {
                tracing::trace!(url, page_id = entry.page.id(), "route matched");
                return Ok(RouteMatch {
                    page: Arc::clone(&entry.page),
                    route_params,
                });
            }
        }

        tracing::debug!(url, "no route matched");
        Err(RouteNotFound {
            url: url.to_string(),
        })
    }
}
