//! Movie catalog lookups that feed candidates into a selection.
//!
//! [`MovieSearch`] is the seam the session layer depends on. [`OmdbClient`]
//! queries the OMDb HTTP API; [`StaticCatalog`] answers from a local JSON file
//! with the same body shape, for offline sessions and tests.

use std::sync::Arc;

use marquee_core::{MovieRecord, Rating, BOX_OFFICE_UNAVAILABLE};
use serde::{Deserialize, Serialize};

mod catalog;
mod omdb;

pub use catalog::{CatalogError, StaticCatalog};
pub use omdb::{OmdbClient, OmdbConfig, DEFAULT_OMDB_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Message OMDb returns for a title lookup that matches nothing.
pub const MOVIE_NOT_FOUND: &str = "Movie not found!";

/// Every variant renders a message that can be shown to the end user as is.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SearchError {
    #[error("Please enter a movie title to search")]
    EmptyQuery,
    #[error("{0}")]
    Catalog(String),
    #[error("Unable to reach the movie catalog: {0}")]
    Transport(String),
    #[error("The movie catalog responded with HTTP status {0}")]
    Status(u16),
    #[error("The movie catalog returned an unreadable response: {0}")]
    Malformed(String),
}

/// Look up a single movie by title.
pub trait MovieSearch {
    /// # Errors
    /// Returns [`SearchError`] when the query is blank, nothing matches, or the
    /// catalog cannot be read.
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError>;
}

impl<T: MovieSearch + ?Sized> MovieSearch for Box<T> {
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError> {
        (**self).search(query)
    }
}

impl<T: MovieSearch + ?Sized> MovieSearch for Arc<T> {
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError> {
        (**self).search(query)
    }
}

impl<T: MovieSearch + ?Sized> MovieSearch for &T {
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError> {
        (**self).search(query)
    }
}

fn normalize_query(query: &str) -> Result<&str, SearchError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    Ok(trimmed)
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct OmdbRating {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// OMDb title-lookup body. Success and error bodies share this shape; only
/// the fields the selection needs are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct OmdbMovie {
    #[serde(rename = "Response", default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "imdbID", default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "BoxOffice", default, skip_serializing_if = "Option::is_none")]
    pub box_office: Option<String>,
    #[serde(rename = "Ratings", default)]
    pub ratings: Vec<OmdbRating>,
}

impl OmdbMovie {
    /// Convert a response body into a [`MovieRecord`].
    ///
    /// # Errors
    /// Returns [`SearchError::Catalog`] for OMDb error bodies and
    /// [`SearchError::Malformed`] when identity fields are missing.
    pub fn into_record(self) -> Result<MovieRecord, SearchError> {
        if let Some(message) = self.error {
            return Err(SearchError::Catalog(message));
        }
        if self.response.as_deref() == Some("False") {
            return Err(SearchError::Catalog(MOVIE_NOT_FOUND.to_string()));
        }

        let id = self
            .imdb_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SearchError::Malformed("missing imdbID".to_string()))?;
        let title = self.title.ok_or_else(|| SearchError::Malformed("missing Title".to_string()))?;

        Ok(MovieRecord {
            id,
            title,
            box_office: self.box_office.unwrap_or_else(|| BOX_OFFICE_UNAVAILABLE.to_string()),
            ratings: self
                .ratings
                .into_iter()
                .map(|rating| Rating { source: rating.source, value: rating.value })
                .collect(),
        })
    }
}

impl From<&MovieRecord> for OmdbMovie {
    fn from(record: &MovieRecord) -> Self {
        Self {
            response: Some("True".to_string()),
            error: None,
            imdb_id: Some(record.id.clone()),
            title: Some(record.title.clone()),
            box_office: Some(record.box_office.clone()),
            ratings: record
                .ratings
                .iter()
                .map(|rating| OmdbRating { source: rating.source.clone(), value: rating.value.clone() })
                .collect(),
        }
    }
}
