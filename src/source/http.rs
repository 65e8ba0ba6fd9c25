//! HTTP movie search client.
//!
//! Talks to the public IMDB search endpoint (`GET {base}/search?q=...`)
//! and narrows its loosely-shaped JSON at the boundary: records missing
//! any of id/title/year/poster are dropped individually.

use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::source::{Movie, MovieSource};

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://imdb.iamidiotareyoutoo.com";

/// `reqwest`-backed [`MovieSource`].
#[derive(Debug, Clone)]
pub struct HttpMovieSource {
    client: reqwest::Client,
    base_url: String,
}

/// Wire shape of the search response.
#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    description: Vec<RawMovie>,
}

/// One unvalidated record as the API sends it.
#[derive(Debug, Deserialize)]
struct RawMovie {
    #[serde(rename = "#IMDB_ID")]
    imdb_id: Option<String>,
    #[serde(rename = "#TITLE")]
    title: Option<String>,
    #[serde(rename = "#YEAR")]
    year: Option<String>,
    #[serde(rename = "#IMG_POSTER")]
    poster: Option<String>,
}

impl RawMovie {
    /// Accept only records carrying all four fields, non-empty.
    fn narrow(self) -> Option<Movie> {
        let imdb_id = self.imdb_id.filter(|s| !s.is_empty())?;
        let title = self.title.filter(|s| !s.is_empty())?;
        let year = self.year.filter(|s| !s.is_empty())?;
        let poster = self.poster.filter(|s| !s.is_empty())?;
        Some(Movie {
            imdb_id,
            title,
            year,
            poster,
        })
    }
}

impl HttpMovieSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for HttpMovieSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_BASE_URL)
    }
}

impl MovieSource for HttpMovieSource {
    async fn search(&self, query: &str) -> Result<Vec<Movie>, FetchError> {
        let envelope: SearchEnvelope = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?
            .error_for_status()
            .map_err(|e| FetchError::network(e.to_string()))?
            .json()
            .await
            .map_err(|e| FetchError::network(e.to_string()))?;

        let total = envelope.description.len();
        let movies: Vec<Movie> = envelope
            .description
            .into_iter()
            .filter_map(RawMovie::narrow)
            .collect();
        if movies.len() < total {
            debug!(
                dropped = total - movies.len(),
                "dropped records with missing fields"
            );
        }
        Ok(movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, title: &str, year: &str, poster: &str) -> RawMovie {
        let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
        RawMovie {
            imdb_id: field(id),
            title: field(title),
            year: field(year),
            poster: field(poster),
        }
    }

    #[test]
    fn complete_record_is_accepted() {
        let movie = raw("tt1", "Batman", "1989", "http://img").narrow().unwrap();
        assert_eq!(movie.title, "Batman");
    }

    #[test]
    fn missing_or_empty_fields_are_rejected() {
        assert!(raw("", "Batman", "1989", "http://img").narrow().is_none());
        assert!(raw("tt1", "", "1989", "http://img").narrow().is_none());
        assert!(raw("tt1", "Batman", "", "http://img").narrow().is_none());
        assert!(raw("tt1", "Batman", "1989", "").narrow().is_none());
    }

    #[test]
    fn envelope_tolerates_absent_description() {
        let envelope: SearchEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.description.is_empty());
    }

    #[test]
    fn envelope_parses_wire_keys() {
        let json = r##"{"description": [{"#IMDB_ID": "tt0096895", "#TITLE": "Batman",
            "#YEAR": "1989", "#IMG_POSTER": "https://img.example/batman.jpg",
            "#RANK": 12}]}"##;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();
        let movie = envelope
            .description
            .into_iter()
            .next()
            .unwrap()
            .narrow()
            .unwrap();
        assert_eq!(movie.imdb_id, "tt0096895");
        assert_eq!(movie.year, "1989");
    }
}
