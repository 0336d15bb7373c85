//! Movie data models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A film as returned by the API, including fields no page uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    /// Missing from list responses; assigned from the list position.
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub release_date: String,
    pub director: String,
    pub producer: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Detail page view of a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub release_date: String,
    pub director: String,
    pub producer: String,
}

/// List page view of a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    pub release_date: String,
}

/// `films.json` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct FilmsResponse {
    pub results: Vec<MovieDetails>,
}

/// `data` of the list page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoviesPageData {
    pub movies: Vec<MovieSummary>,
    pub title: String,
}

/// `data` of the detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoviePageData {
    pub movie: Movie,
    pub title: String,
}
