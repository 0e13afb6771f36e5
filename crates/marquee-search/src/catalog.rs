use std::fs;
use std::path::Path;

use marquee_core::MovieRecord;

use crate::{normalize_query, MovieSearch, OmdbMovie, SearchError, MOVIE_NOT_FOUND};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog file is not a JSON array of OMDb movies: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-memory catalog answering title lookups the way OMDb's `t=` parameter
/// does: one exact, case-insensitive title match.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    movies: Vec<OmdbMovie>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(movies: Vec<OmdbMovie>) -> Self {
        Self { movies }
    }

    #[must_use]
    pub fn from_records(records: &[MovieRecord]) -> Self {
        Self::new(records.iter().map(OmdbMovie::from).collect())
    }

    /// # Errors
    /// Returns [`CatalogError::Parse`] when `json` is not an array of OMDb movies.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// # Errors
    /// Returns [`CatalogError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let body = fs::read_to_string(path)?;
        let catalog = Self::from_json(&body)?;
        tracing::debug!(path = %path.display(), movies = catalog.len(), "loaded static catalog");
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl MovieSearch for StaticCatalog {
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError> {
        let wanted = normalize_query(query)?.to_lowercase();
        self.movies
            .iter()
            .find(|movie| {
                movie.title.as_deref().is_some_and(|title| title.trim().to_lowercase() == wanted)
            })
            .cloned()
            .ok_or_else(|| SearchError::Catalog(MOVIE_NOT_FOUND.to_string()))?
            .into_record()
    }
}
