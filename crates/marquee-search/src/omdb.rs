use std::time::Duration;

use marquee_core::MovieRecord;
use serde::{Deserialize, Serialize};

use crate::{normalize_query, MovieSearch, OmdbMovie, SearchError};

pub const DEFAULT_OMDB_BASE_URL: &str = "http://www.omdbapi.com/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// OMDb request configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OmdbConfig {
    pub base_url: String,
    pub api_key: String,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl OmdbConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OMDB_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Blocking OMDb client. Each search is one `GET ?t=<title>&type=movie`.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    agent: ureq::Agent,
    config: OmdbConfig,
}

impl OmdbClient {
    #[must_use]
    pub fn new(config: OmdbConfig) -> Self {
        let agent =
            ureq::AgentBuilder::new().timeout(Duration::from_secs(config.timeout_secs)).build();
        Self { agent, config }
    }

    #[must_use]
    pub fn config(&self) -> &OmdbConfig {
        &self.config
    }
}

impl MovieSearch for OmdbClient {
    fn search(&self, query: &str) -> Result<MovieRecord, SearchError> {
        let title = normalize_query(query)?;
        tracing::debug!(title, base_url = %self.config.base_url, "searching omdb");

        let response = self
            .agent
            .get(&self.config.base_url)
            .query("apikey", &self.config.api_key)
            .query("t", title)
            .query("type", "movie")
            .call();

        let body = match response {
            Ok(response) => response,
            // OMDb reports bad keys and quota exhaustion as 401 with a JSON error body.
            Err(ureq::Error::Status(code, response)) => {
                tracing::warn!(code, title, "omdb returned an error status");
                return Err(response
                    .into_json::<OmdbMovie>()
                    .ok()
                    .and_then(|body| body.error)
                    .map_or(SearchError::Status(code), SearchError::Catalog));
            }
            Err(ureq::Error::Transport(transport)) => {
                tracing::warn!(title, error = %transport, "omdb request failed");
                return Err(SearchError::Transport(transport.to_string()));
            }
        };

        let movie = body
            .into_json::<OmdbMovie>()
            .map_err(|err| SearchError::Malformed(err.to_string()))?;
        movie.into_record()
    }
}
