//! Star Wars API access.

use async_trait::async_trait;
use vista_sdk::vista_data::{FetchError, FetchPolicy, JsonClient};

use super::types::{FilmsResponse, MovieDetails};

/// Public Star Wars API.
pub const API_BASE: &str = "https://star-wars.brillout.com/api";

/// Source of movie data.
#[async_trait]
pub trait MovieApi: Send + Sync {
    /// All films, with ids assigned from their list position (1-based).
    async fn list_movies(&self) -> anyhow::Result<Vec<MovieDetails>>;

    /// One film by id.
    async fn movie(&self, id: &str) -> anyhow::Result<MovieDetails>;
}

/// `MovieApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMovieApi {
    client: JsonClient,
}

impl HttpMovieApi {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_policy(FetchPolicy::default())
    }

    pub fn with_policy(policy: FetchPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            client: JsonClient::with_policy(policy)?.with_base_url(API_BASE),
        })
    }

    /// Point at another API root, e.g. a local mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl MovieApi for HttpMovieApi {
    async fn list_movies(&self) -> anyhow::Result<Vec<MovieDetails>> {
        let response: FilmsResponse = self.client.get_json("films.json").await?;
        tracing::debug!(count = response.results.len(), "fetched film list");
        Ok(response
            .results
            .into_iter()
            .enumerate()
            .map(|(i, mut movie)| {
                movie.id = (i + 1).to_string();
                movie
            })
            .collect())
    }

    async fn movie(&self, id: &str) -> anyhow::Result<MovieDetails> {
        let mut movie: MovieDetails = self.client.get_json(&format!("films/{id}.json")).await?;
        if movie.id.is_empty() {
            movie.id = id.to_string();
        }
        Ok(movie)
    }
}
