//! `/star-wars/:movieId`: one movie.

use std::sync::Arc;

use async_trait::async_trait;
use vista_sdk::vista_core::{
    DataHook, GuardHook, HookError, PageContext, PageContextPatch, RenderHook, RenderOutput,
};
use vista_sdk::vista_streaming::escape_html;

use super::index::movie_patch;
use super::{document, page_data};
use crate::data::{MovieApi, MoviePageData};

/// Rejects ids that cannot name a film.
pub struct MovieGuard;

#[async_trait]
impl GuardHook for MovieGuard {
    async fn guard(&self, ctx: &PageContext) -> Result<(), HookError> {
        let id = ctx.route_param("movieId").unwrap_or_default();
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HookError::status(404, format!("Unknown movie '{id}'")));
        }
        Ok(())
    }
}

/// Fetches one film.
pub struct MovieData {
    api: Arc<dyn MovieApi>,
}

impl MovieData {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataHook for MovieData {
    async fn data(&self, ctx: &PageContext) -> Result<PageContextPatch, HookError> {
        let id = ctx
            .route_param("movieId")
            .ok_or_else(|| HookError::msg("missing movieId"))?;
        let movie = self.api.movie(id).await?;
        movie_patch(&movie)
    }
}

/// Renders one film.
pub struct MovieView {
    serialized_keys: Vec<String>,
}

impl MovieView {
    pub fn new(serialized_keys: Vec<String>) -> Self {
        Self { serialized_keys }
    }
}

#[async_trait]
impl RenderHook for MovieView {
    async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
        let MoviePageData { movie, title } = page_data(ctx)?;
        let title = ctx.title.clone().unwrap_or(title);

        let body = format!(
            "<h1>{}</h1>\n<p>Release Date: {}</p>\n<p>Director: {}</p>\n<p>Producer: {}</p>\n",
            escape_html(&movie.title),
            escape_html(&movie.release_date),
            escape_html(&movie.director),
            escape_html(&movie.producer)
        );

        Ok(document(ctx, &title, &body, &self.serialized_keys))
    }
}
