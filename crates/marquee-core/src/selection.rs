use serde::{Deserialize, Serialize};

use crate::record::MovieRecord;
use crate::stats::{mean, median, standard_deviation};
use crate::{RejectionReason, SelectionError};

/// Statistics derived from the current selection. All zero when empty.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateStats {
    pub mean_box_office: f64,
    pub std_dev_box_office: f64,
    pub median_critic_score: f64,
}

/// Ordered working set of selected movies, unique by `id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionStore {
    items: Vec<MovieRecord>,
}

impl SelectionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[MovieRecord] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.items.get(index)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Offer a candidate to the selection.
    ///
    /// Rules apply in order and the first match wins: an `id` already in the
    /// set, an unavailable box office, a missing Rotten Tomatoes rating.
    /// A rejected candidate is dropped and the set is left as it was.
    ///
    /// # Errors
    /// Returns the [`RejectionReason`] of the first rule the candidate fails.
    pub fn try_add(&mut self, candidate: MovieRecord) -> Result<(), RejectionReason> {
        if self.contains(&candidate.id) {
            return Err(RejectionReason::Duplicate);
        }
        if !candidate.has_box_office() {
            return Err(RejectionReason::MissingBoxOffice);
        }
        if candidate.critic_rating().is_none() {
            return Err(RejectionReason::MissingCriticScore);
        }

        self.items.push(candidate);
        Ok(())
    }

    /// Remove and return the movie at `index`, shifting later entries down.
    ///
    /// # Errors
    /// Returns [`SelectionError::IndexOutOfRange`] when `index >= len`.
    pub fn remove_at(&mut self, index: usize) -> Result<MovieRecord, SelectionError> {
        if index >= self.items.len() {
            return Err(SelectionError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Recompute statistics over the current selection.
    ///
    /// # Errors
    /// Returns [`SelectionError::MalformedData`] for the first selected movie
    /// whose box office or critic score does not parse.
    pub fn current_aggregate(&self) -> Result<AggregateStats, SelectionError> {
        if self.items.is_empty() {
            return Ok(AggregateStats::default());
        }

        #[allow(clippy::cast_precision_loss)]
        let box_office = self
            .items
            .iter()
            .map(|item| item.box_office_amount().map(|amount| amount as f64))
            .collect::<Result<Vec<_>, _>>()?;
        let critic_scores = self
            .items
            .iter()
            .map(|item| item.critic_score().map(f64::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AggregateStats {
            mean_box_office: mean(&box_office)?,
            std_dev_box_office: standard_deviation(&box_office)?,
            median_critic_score: median(&critic_scores),
        })
    }
}
