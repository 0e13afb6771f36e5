use serde::{Deserialize, Serialize};

use crate::{DataField, SelectionError};

/// Sentinel the catalog uses for an absent box-office figure.
pub const BOX_OFFICE_UNAVAILABLE: &str = "N/A";

/// Rating source whose percentage is used as the critic score.
pub const ROTTEN_TOMATOES_SOURCE: &str = "Rotten Tomatoes";

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Rating {
    pub source: String,
    pub value: String,
}

/// Snapshot of one catalog entry as it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MovieRecord {
    pub id: String,
    pub title: String,
    pub box_office: String,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl MovieRecord {
    #[must_use]
    pub fn has_box_office(&self) -> bool {
        self.box_office != BOX_OFFICE_UNAVAILABLE
    }

    /// Raw Rotten Tomatoes value (e.g. `"73%"`), if the record carries one.
    #[must_use]
    pub fn critic_rating(&self) -> Option<&str> {
        self.ratings
            .iter()
            .find(|rating| rating.source == ROTTEN_TOMATOES_SOURCE)
            .map(|rating| rating.value.as_str())
    }

    /// Parsed box-office amount in whole currency units.
    ///
    /// # Errors
    /// Returns [`SelectionError::MalformedData`] when the field is not a
    /// currency-formatted integer.
    pub fn box_office_amount(&self) -> Result<u64, SelectionError> {
        parse_box_office(&self.box_office).ok_or_else(|| SelectionError::MalformedData {
            id: self.id.clone(),
            field: DataField::BoxOffice,
            value: self.box_office.clone(),
        })
    }

    /// Parsed Rotten Tomatoes percentage.
    ///
    /// # Errors
    /// Returns [`SelectionError::MalformedData`] when the rating is absent or
    /// not an integer percentage.
    pub fn critic_score(&self) -> Result<u32, SelectionError> {
        let raw = self.critic_rating();
        raw.and_then(parse_critic_score).ok_or_else(|| SelectionError::MalformedData {
            id: self.id.clone(),
            field: DataField::CriticScore,
            value: raw.unwrap_or_default().to_string(),
        })
    }
}

/// Parse a monetary string such as `"$1,234,567"` into an integer amount.
///
/// The currency symbol and thousands separators are stripped; whatever
/// remains must be a plain run of ASCII digits.
#[must_use]
pub fn parse_box_office(raw: &str) -> Option<u64> {
    let digits = raw.trim().chars().filter(|ch| !matches!(ch, '$' | ',')).collect::<String>();
    parse_digits(&digits)
}

/// Parse a percentage string such as `"73%"` into its integer value.
#[must_use]
pub fn parse_critic_score(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix('%').unwrap_or(trimmed);
    parse_digits(digits).and_then(|value| u32::try_from(value).ok())
}

fn parse_digits(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(box_office: &str, ratings: &[(&str, &str)]) -> MovieRecord {
        MovieRecord {
            id: "tt0111161".to_string(),
            title: "The Shawshank Redemption".to_string(),
            box_office: box_office.to_string(),
            ratings: ratings
                .iter()
                .map(|(source, value)| Rating {
                    source: (*source).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn box_office_strips_currency_symbol_and_separators() {
        assert_eq!(parse_box_office("$100,000,000"), Some(100_000_000));
        assert_eq!(parse_box_office("$28,767,189"), Some(28_767_189));
        assert_eq!(parse_box_office("1500"), Some(1500));
    }

    #[test]
    fn box_office_rejects_text_instead_of_coercing_it() {
        assert_eq!(parse_box_office("N/A"), None);
        assert_eq!(parse_box_office("$"), None);
        assert_eq!(parse_box_office("$12.5M"), None);
        assert_eq!(parse_box_office("-$100"), None);
        assert_eq!(parse_box_office(""), None);
    }

    #[test]
    fn critic_score_requires_integer_percentage() {
        assert_eq!(parse_critic_score("73%"), Some(73));
        assert_eq!(parse_critic_score("100%"), Some(100));
        assert_eq!(parse_critic_score("8"), Some(8));
        assert_eq!(parse_critic_score("7.5/10"), None);
        assert_eq!(parse_critic_score("%"), None);
    }

    #[test]
    fn critic_rating_is_looked_up_by_source() {
        let movie = record(
            "$1,000",
            &[("Internet Movie Database", "9.3/10"), ("Rotten Tomatoes", "91%")],
        );
        assert_eq!(movie.critic_rating(), Some("91%"));
        assert_eq!(movie.critic_score(), Ok(91));
        assert_eq!(movie.box_office_amount(), Ok(1000));
    }

    #[test]
    fn missing_critic_rating_is_malformed_data() {
        let movie = record("$1,000", &[("Metacritic", "82/100")]);
        assert_eq!(
            movie.critic_score(),
            Err(SelectionError::MalformedData {
                id: "tt0111161".to_string(),
                field: DataField::CriticScore,
                value: String::new(),
            })
        );
    }

    #[test]
    fn unavailable_box_office_is_detected() {
        assert!(!record(BOX_OFFICE_UNAVAILABLE, &[]).has_box_office());
        assert!(record("$5", &[]).has_box_office());
    }
}
