//! Pure reductions of API data to what the pages send to the client.

use super::types::{Movie, MovieDetails, MovieSummary};

/// Keep only the fields the detail page shows.
pub fn filter_movie_data(movie: &MovieDetails) -> Movie {
    Movie {
        id: movie.id.clone(),
        title: movie.title.clone(),
        release_date: movie.release_date.clone(),
        director: movie.director.clone(),
        producer: movie.producer.clone(),
    }
}

/// Keep only the fields the list page shows.
pub fn filter_movies_data(movies: &[MovieDetails]) -> Vec<MovieSummary> {
    movies
        .iter()
        .map(|m| MovieSummary {
            id: m.id.clone(),
            title: m.title.clone(),
            release_date: m.release_date.clone(),
        })
        .collect()
}

/// List page title.
pub fn get_title(movies: &[MovieDetails]) -> String {
    format!("{} Star Wars Movies", movies.len())
}
