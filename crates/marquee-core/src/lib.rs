//! Selection and aggregation engine for curated movie sets.
//!
//! [`SelectionStore`] admits catalog records into an ordered working set and
//! derives box-office and critic-score statistics from it on every read. The
//! numeric work lives in [`stats`]; string parsing of catalog fields lives in
//! [`record`].

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod record;
pub mod selection;
pub mod stats;

pub use record::{
    parse_box_office, parse_critic_score, MovieRecord, Rating, BOX_OFFICE_UNAVAILABLE,
    ROTTEN_TOMATOES_SOURCE,
};
pub use selection::{AggregateStats, SelectionStore};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum StatsError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SelectionError {
    #[error("index {index} is out of range for a selection of {len} movies")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("movie {id} has malformed {field} data: {value:?}")]
    MalformedData { id: String, field: DataField, value: String },
    #[error(transparent)]
    Statistics(#[from] StatsError),
}

/// Catalog field that failed to parse while computing an aggregate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataField {
    BoxOffice,
    CriticScore,
}

impl DataField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoxOffice => "box_office",
            Self::CriticScore => "critic_score",
        }
    }
}

impl Display for DataField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate was refused admission. Rejections are ordinary results,
/// not failures: the caller turns them into a message for the user.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, thiserror::Error,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    #[error("Movie already selected, please search for a new one")]
    Duplicate,
    #[error("Movie does not contain box office data to display")]
    MissingBoxOffice,
    #[error("Movie does not contain a Rotten Tomatoes score to display")]
    MissingCriticScore,
}

impl RejectionReason {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::MissingBoxOffice => "MISSING_BOX_OFFICE",
            Self::MissingCriticScore => "MISSING_CRITIC_SCORE",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DUPLICATE" => Some(Self::Duplicate),
            "MISSING_BOX_OFFICE" => Some(Self::MissingBoxOffice),
            "MISSING_CRITIC_SCORE" => Some(Self::MissingCriticScore),
            _ => None,
        }
    }

    /// User-facing text, identical to the `Display` output.
    #[must_use]
    pub fn message(self) -> String {
        self.to_string()
    }
}
