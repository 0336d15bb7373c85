//! `/star-wars`: the movie list.

use std::sync::Arc;

use async_trait::async_trait;
use vista_sdk::vista_core::{
    DataHook, HookError, PageContext, PageContextPatch, PrerenderEntry, PrerenderHook,
    RenderHook, RenderOutput,
};
use vista_sdk::vista_streaming::escape_html;

use super::{document, page_data};
use crate::data::{
    filter_movie_data, filter_movies_data, get_title, MovieApi, MovieDetails, MoviePageData,
    MoviesPageData,
};

fn movies_patch(movies: &[MovieDetails]) -> Result<PageContextPatch, HookError> {
    let title = get_title(movies);
    let data = MoviesPageData {
        movies: filter_movies_data(movies),
        title: title.clone(),
    };
    Ok(PageContextPatch::new()
        .with_data(serde_json::to_value(data).map_err(anyhow::Error::from)?)
        .with_title(title))
}

/// Detail page context. Also used by the detail page's own data hook.
pub(crate) fn movie_patch(movie: &MovieDetails) -> Result<PageContextPatch, HookError> {
    let movie = filter_movie_data(movie);
    let mut props = serde_json::Map::new();
    props.insert(
        "movie".to_string(),
        serde_json::to_value(&movie).map_err(anyhow::Error::from)?,
    );
    let data = MoviePageData {
        title: movie.title.clone(),
        movie,
    };
    let title = data.title.clone();
    Ok(PageContextPatch::new()
        .with_data(serde_json::to_value(data).map_err(anyhow::Error::from)?)
        .with_page_props(serde_json::Value::Object(props))
        .with_title(title))
}

/// Fetches the film list.
pub struct MoviesData {
    api: Arc<dyn MovieApi>,
}

impl MoviesData {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataHook for MoviesData {
    async fn data(&self, _ctx: &PageContext) -> Result<PageContextPatch, HookError> {
        let movies = self.api.list_movies().await?;
        movies_patch(&movies)
    }
}

/// Renders the film list.
pub struct MoviesView {
    serialized_keys: Vec<String>,
}

impl MoviesView {
    pub fn new(serialized_keys: Vec<String>) -> Self {
        Self { serialized_keys }
    }
}

#[async_trait]
impl RenderHook for MoviesView {
    async fn render(&self, ctx: &PageContext) -> Result<RenderOutput, HookError> {
        let data: MoviesPageData = page_data(ctx)?;
        let title = ctx.title.as_deref().unwrap_or(&data.title);

        let mut body = format!("<h1>{}</h1>\n<ol>\n", escape_html(&data.title));
        for movie in &data.movies {
            body.push_str(&format!(
                "<li><a href=\"/star-wars/{}\">{}</a> ({})</li>\n",
                escape_html(&movie.id),
                escape_html(&movie.title),
                escape_html(&movie.release_date)
            ));
        }
        body.push_str("</ol>\n");

        Ok(document(ctx, title, &body, &self.serialized_keys))
    }
}

/// Enumerates the list page and every detail page from one list fetch.
///
/// Each entry carries its page data, so no data hook runs while
/// prerendering.
pub struct MoviesPrerender {
    api: Arc<dyn MovieApi>,
}

impl MoviesPrerender {
    pub fn new(api: Arc<dyn MovieApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PrerenderHook for MoviesPrerender {
    async fn enumerate(&self) -> Result<Vec<PrerenderEntry>, HookError> {
        let movies = self.api.list_movies().await?;

        let mut entries = Vec::with_capacity(movies.len() + 1);
        entries.push(PrerenderEntry::new("/star-wars").with_page_context(movies_patch(&movies)?));
        for movie in &movies {
            entries.push(
                PrerenderEntry::new(format!("/star-wars/{}", movie.id))
                    .with_page_context(movie_patch(movie)?),
            );
        }
        Ok(entries)
    }
}
