//! Session layer over the selection engine.
//!
//! A [`MovieSession`] owns one [`SelectionStore`] together with the transient
//! state a front end needs around it: the query text, the candidate returned
//! by the last search, and the notice to show the user. Front ends read a
//! [`SessionView`] and drive the session with discrete calls.

use std::fmt::{Display, Formatter};

use marquee_core::{
    AggregateStats, MovieRecord, RejectionReason, SelectionError, SelectionStore,
};
use marquee_search::{MovieSearch, SearchError};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

mod format;

pub use format::{format_percent, format_usd};

pub const API_CONTRACT_VERSION: &str = "api.v1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SessionId(pub Ulid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SessionError {
    #[error("no movie is pending, search for a movie first")]
    NoPendingCandidate,
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateView {
    pub id: String,
    pub title: String,
    pub box_office: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedMovie {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub box_office: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatsStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsDisplay {
    pub mean_box_office: String,
    pub std_dev_box_office: String,
    pub median_critic_score: String,
}

/// Aggregate numbers plus their display strings. A `degraded` view carries
/// zeroed numbers and the reason in `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsView {
    pub status: StatsStatus,
    pub movie_count: usize,
    pub mean_box_office: f64,
    pub std_dev_box_office: f64,
    pub median_critic_score: f64,
    pub display: StatsDisplay,
    pub error: Option<String>,
}

impl StatsView {
    /// Statistics for `store`, degraded rather than failing when a selected
    /// record carries unparsable data.
    #[must_use]
    pub fn from_store(store: &SelectionStore) -> Self {
        match store.current_aggregate() {
            Ok(stats) => Self::from_stats(stats, store.len()),
            Err(err) => {
                tracing::warn!(error = %err, "aggregate degraded");
                Self::degraded(&err, store.len())
            }
        }
    }

    fn from_stats(stats: AggregateStats, movie_count: usize) -> Self {
        Self {
            status: StatsStatus::Ok,
            movie_count,
            mean_box_office: stats.mean_box_office,
            std_dev_box_office: stats.std_dev_box_office,
            median_critic_score: stats.median_critic_score,
            display: StatsDisplay {
                mean_box_office: format_usd(stats.mean_box_office),
                std_dev_box_office: format_usd(stats.std_dev_box_office),
                median_critic_score: format_percent(stats.median_critic_score),
            },
            error: None,
        }
    }

    fn degraded(err: &SelectionError, movie_count: usize) -> Self {
        Self {
            status: StatsStatus::Degraded,
            error: Some(err.to_string()),
            ..Self::from_stats(AggregateStats::default(), movie_count)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionView {
    pub session_id: SessionId,
    pub query: String,
    pub pending: Option<CandidateView>,
    pub notice: Option<String>,
    pub selected: Vec<SelectedMovie>,
    pub stats: StatsView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddOutcome {
    pub admitted: bool,
    pub movie_id: String,
    pub title: String,
    pub rejection: Option<RejectionReason>,
    pub message: Option<String>,
}

/// One user's working session: a selection plus search-driven UI state.
#[derive(Debug)]
pub struct MovieSession<S> {
    session_id: SessionId,
    catalog: S,
    store: SelectionStore,
    query: String,
    pending: Option<MovieRecord>,
    notice: Option<String>,
}

impl<S: MovieSearch> MovieSession<S> {
    #[must_use]
    pub fn new(search: S) -> Self {
        Self {
            session_id: SessionId::new(),
            catalog: search,
            store: SelectionStore::new(),
            query: String::new(),
            pending: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn pending(&self) -> Option<&MovieRecord> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Look up `query` and hold the result as the pending candidate.
    ///
    /// A failed lookup clears any previous candidate and leaves the
    /// collaborator's message as the notice.
    ///
    /// # Errors
    /// Returns the [`SearchError`] reported by the search collaborator.
    pub fn search(&mut self, query: &str) -> Result<&MovieRecord, SearchError> {
        let result = self.catalog.search(query);
        self.apply_search(query, result)
    }

    /// Record the outcome of a lookup for `query` made outside the session.
    /// Same effect on the session state as [`MovieSession::search`].
    ///
    /// # Errors
    /// Returns `result`'s [`SearchError`] after turning it into the notice.
    pub fn apply_search(
        &mut self,
        query: &str,
        result: Result<MovieRecord, SearchError>,
    ) -> Result<&MovieRecord, SearchError> {
        query.clone_into(&mut self.query);
        match result {
            Ok(record) => {
                tracing::info!(id = %record.id, title = %record.title, "search found candidate");
                self.notice = None;
                Ok(&*self.pending.insert(record))
            }
            Err(err) => {
                tracing::info!(query, error = %err, "search failed");
                self.pending = None;
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Offer the pending candidate to the selection.
    ///
    /// Admission clears the candidate, the query and the notice. A rejection
    /// discards the candidate and turns the reason into the notice.
    ///
    /// # Errors
    /// Returns [`SessionError::NoPendingCandidate`] when nothing is pending.
    pub fn add_pending(&mut self) -> Result<AddOutcome, SessionError> {
        let candidate = self.pending.take().ok_or(SessionError::NoPendingCandidate)?;
        let movie_id = candidate.id.clone();
        let title = candidate.title.clone();

        match self.store.try_add(candidate) {
            Ok(()) => {
                tracing::info!(id = %movie_id, selected = self.store.len(), "movie admitted");
                self.query.clear();
                self.notice = None;
                Ok(AddOutcome { admitted: true, movie_id, title, rejection: None, message: None })
            }
            Err(reason) => {
                tracing::info!(id = %movie_id, reason = reason.code(), "movie rejected");
                let message = reason.message();
                self.notice = Some(message.clone());
                Ok(AddOutcome {
                    admitted: false,
                    movie_id,
                    title,
                    rejection: Some(reason),
                    message: Some(message),
                })
            }
        }
    }

    /// Remove the selected movie at `index`.
    ///
    /// # Errors
    /// Returns [`SelectionError::IndexOutOfRange`] (wrapped) for a negative
    /// index or one past the end of the selection.
    pub fn remove(&mut self, index: i64) -> Result<MovieRecord, SessionError> {
        let position = usize::try_from(index).map_err(|_| SelectionError::IndexOutOfRange {
            index,
            len: self.store.len(),
        })?;
        let removed = self.store.remove_at(position)?;
        tracing::info!(id = %removed.id, index, selected = self.store.len(), "movie removed");
        Ok(removed)
    }

    #[must_use]
    pub fn selected(&self) -> Vec<SelectedMovie> {
        self.store
            .items()
            .iter()
            .enumerate()
            .map(|(index, movie)| SelectedMovie {
                index,
                id: movie.id.clone(),
                title: movie.title.clone(),
                box_office: movie.box_office.clone(),
            })
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> StatsView {
        StatsView::from_store(&self.store)
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id,
            query: self.query.clone(),
            pending: self.pending.as_ref().map(|movie| CandidateView {
                id: movie.id.clone(),
                title: movie.title.clone(),
                box_office: movie.box_office.clone(),
            }),
            notice: self.notice.clone(),
            selected: self.selected(),
            stats: self.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use marquee_core::{Rating, BOX_OFFICE_UNAVAILABLE};
    use marquee_search::StaticCatalog;

    use super::*;

    fn movie(id: &str, title: &str, box_office: &str, critic_score: Option<&str>) -> MovieRecord {
        MovieRecord {
            id: id.to_string(),
            title: title.to_string(),
            box_office: box_office.to_string(),
            ratings: critic_score
                .map(|score| Rating { source: "Rotten Tomatoes".to_string(), value: score.to_string() })
                .into_iter()
                .collect(),
        }
    }

    fn session() -> MovieSession<StaticCatalog> {
        MovieSession::new(StaticCatalog::from_records(&[
            movie("tt1", "Alpha", "$100,000", Some("80%")),
            movie("tt2", "Beta", "$300,000", Some("60%")),
            movie("tt3", "Gamma", BOX_OFFICE_UNAVAILABLE, Some("90%")),
            movie("tt4", "Delta", "$50,000", None),
            movie("tt5", "Epsilon", "$1.2M", Some("40%")),
        ]))
    }

    fn search_and_add(session: &mut MovieSession<StaticCatalog>, title: &str) -> AddOutcome {
        if let Err(err) = session.search(title) {
            panic!("search for {title} should succeed: {err}");
        }
        session.add_pending().unwrap_or_else(|err| panic!("add should not fail: {err}"))
    }

    #[test]
    fn successful_add_clears_candidate_query_and_notice() {
        let mut session = session();
        let found = session
            .search("alpha")
            .unwrap_or_else(|err| panic!("search should succeed: {err}"))
            .id
            .clone();
        assert_eq!(found, "tt1");
        assert_eq!(session.query(), "alpha");
        assert!(session.pending().is_some());

        let outcome = session.add_pending().unwrap_or_else(|err| panic!("add should work: {err}"));
        assert!(outcome.admitted);
        assert_eq!(outcome.movie_id, "tt1");
        assert!(session.pending().is_none());
        assert_eq!(session.query(), "");
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn failed_search_sets_notice_and_clears_candidate() {
        let mut session = session();
        assert!(session.search("Alpha").is_ok());
        assert_eq!(
            session.search("Omega"),
            Err(SearchError::Catalog("Movie not found!".to_string()))
        );
        assert_eq!(session.notice(), Some("Movie not found!"));
        assert!(session.pending().is_none());
        assert_eq!(session.query(), "Omega");

        assert!(session.search("Beta").is_ok());
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn externally_resolved_search_updates_session_like_a_direct_one() {
        let mut session = session();
        let record = movie("tt9", "Iota", "$10,000", Some("55%"));
        let applied = session
            .apply_search("iota", Ok(record.clone()))
            .unwrap_or_else(|err| panic!("applied result should be accepted: {err}"));
        assert_eq!(applied, &record);
        assert_eq!(session.query(), "iota");
        assert_eq!(session.pending(), Some(&record));

        let failure = SearchError::Transport("connection reset".to_string());
        assert_eq!(session.apply_search("Kappa", Err(failure.clone())), Err(failure.clone()));
        assert!(session.pending().is_none());
        assert_eq!(session.notice(), Some(failure.to_string().as_str()));
        assert_eq!(session.query(), "Kappa");
    }

    #[test]
    fn duplicate_add_reports_notice_and_keeps_selection() {
        let mut session = session();
        assert!(search_and_add(&mut session, "Alpha").admitted);

        let outcome = search_and_add(&mut session, "Alpha");
        assert!(!outcome.admitted);
        assert_eq!(outcome.rejection, Some(RejectionReason::Duplicate));
        assert_eq!(
            session.notice(),
            Some("Movie already selected, please search for a new one")
        );
        assert!(session.pending().is_none());
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn incomplete_candidates_are_turned_away_with_messages() {
        let mut session = session();

        let outcome = search_and_add(&mut session, "Gamma");
        assert_eq!(outcome.rejection, Some(RejectionReason::MissingBoxOffice));
        assert_eq!(
            outcome.message.as_deref(),
            Some("Movie does not contain box office data to display")
        );

        let outcome = search_and_add(&mut session, "Delta");
        assert_eq!(outcome.rejection, Some(RejectionReason::MissingCriticScore));
        assert!(session.store().is_empty());
        assert_eq!(session.query(), "Delta");
    }

    #[test]
    fn add_without_candidate_is_an_error() {
        let mut session = session();
        assert_eq!(session.add_pending(), Err(SessionError::NoPendingCandidate));
    }

    #[test]
    fn remove_rejects_negative_and_past_end_indices() {
        let mut session = session();
        assert!(search_and_add(&mut session, "Alpha").admitted);

        assert_eq!(
            session.remove(-1),
            Err(SessionError::Selection(SelectionError::IndexOutOfRange { index: -1, len: 1 }))
        );
        assert_eq!(
            session.remove(1),
            Err(SessionError::Selection(SelectionError::IndexOutOfRange { index: 1, len: 1 }))
        );
        assert_eq!(session.store().len(), 1);

        let removed = session.remove(0).unwrap_or_else(|err| panic!("remove should work: {err}"));
        assert_eq!(removed.id, "tt1");
        assert!(session.store().is_empty());
    }

    #[test]
    fn view_tracks_selection_and_formatted_statistics() {
        let mut session = session();
        let empty = session.view();
        assert_eq!(empty.stats.status, StatsStatus::Ok);
        assert_eq!(empty.stats.display.mean_box_office, "$0.00");
        assert_eq!(empty.stats.display.median_critic_score, "0%");

        assert!(search_and_add(&mut session, "Alpha").admitted);
        assert!(search_and_add(&mut session, "Beta").admitted);

        let view = session.view();
        assert_eq!(
            view.selected.iter().map(|movie| movie.id.as_str()).collect::<Vec<_>>(),
            vec!["tt1", "tt2"]
        );
        assert_eq!(view.selected[1].index, 1);
        assert_eq!(view.stats.movie_count, 2);
        assert_eq!(view.stats.display.mean_box_office, "$200,000.00");
        assert_eq!(view.stats.display.std_dev_box_office, "$100,000.00");
        assert_eq!(view.stats.display.median_critic_score, "70%");

        assert!(session.remove(0).is_ok());
        let view = session.view();
        assert_eq!(view.stats.display.mean_box_office, "$300,000.00");
        assert_eq!(view.stats.display.std_dev_box_office, "$0.00");
        assert_eq!(view.stats.display.median_critic_score, "60%");
    }

    #[test]
    fn malformed_selection_degrades_statistics_instead_of_failing() {
        let mut session = session();
        assert!(search_and_add(&mut session, "Alpha").admitted);
        assert!(search_and_add(&mut session, "Epsilon").admitted);

        let stats = session.stats();
        assert_eq!(stats.status, StatsStatus::Degraded);
        assert_eq!(stats.movie_count, 2);
        assert_eq!(stats.mean_box_office, 0.0);
        assert_eq!(
            stats.error.as_deref(),
            Some("movie tt5 has malformed box_office data: \"$1.2M\"")
        );

        assert!(session.remove(1).is_ok());
        assert_eq!(session.stats().status, StatsStatus::Ok);
    }

    #[test]
    fn session_view_serializes_with_snake_case_fields() {
        let mut session = session();
        assert!(session.search("Alpha").is_ok());
        let value = serde_json::to_value(session.view())
            .unwrap_or_else(|err| panic!("view should serialize: {err}"));

        assert_eq!(value["query"], "Alpha");
        assert_eq!(value["pending"]["id"], "tt1");
        assert_eq!(value["stats"]["status"], "ok");
        assert!(value["notice"].is_null());
        assert_eq!(value["session_id"], session.session_id().to_string());
    }
}
