//! Star Wars movie pages - Reference workload.
//!
//! Two pages exercise every hook kind:
//! - `/star-wars` lists all films (data, render and prerender hooks)
//! - `/star-wars/:movieId` shows one film (guard, data and render hooks)
//!
//! The list page's prerender hook fetches the film list once and hands
//! every URL its page data, so prerendering makes exactly one API call.

pub mod data;
pub mod pages;

use std::sync::Arc;

use vista_sdk::vista_core::{Page, PrerenderConfig};
use vista_sdk::vista_pipeline::Renderer;
use vista_sdk::vista_router::{RouteError, RouteResolver};

use data::MovieApi;
use pages::{MovieData, MovieGuard, MovieView, MoviesData, MoviesPrerender, MoviesView};

/// Builder for the workload's pages.
pub struct StarWars {
    api: Arc<dyn MovieApi>,
    serialized_keys: Vec<String>,
}

impl StarWars {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        Self {
            api,
            serialized_keys: PrerenderConfig::default().serialized_keys,
        }
    }

    /// Page context keys embedded in rendered documents.
    pub fn with_serialized_keys(mut self, keys: Vec<String>) -> Self {
        self.serialized_keys = keys;
        self
    }

    /// The pages, in registration order.
    pub fn pages(&self) -> Vec<Page> {
        vec![
            Page::new("movies", "/star-wars")
                .with_data(MoviesData::new(Arc::clone(&self.api)))
                .with_render(MoviesView::new(self.serialized_keys.clone()))
                .with_prerender(MoviesPrerender::new(Arc::clone(&self.api))),
            Page::new("movie", "/star-wars/:movieId")
                .with_guard(MovieGuard)
                .with_data(MovieData::new(Arc::clone(&self.api)))
                .with_render(MovieView::new(self.serialized_keys.clone())),
        ]
    }

    pub fn resolver(&self) -> Result<RouteResolver, RouteError> {
        RouteResolver::from_pages(self.pages())
    }

    pub fn renderer(&self) -> Result<Renderer, RouteError> {
        Ok(Renderer::new(self.resolver()?))
    }
}
