// Activity response domain types
//
// A respondent has at most one response per activity; a second submission
// replaces the first. Results are aggregated on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::activity::{ActivityKind, DEFAULT_FREE_RESPONSE_MAX_LENGTH};
use crate::error::{DomainError, Result};

/// Participant token length bounds.
pub const MIN_PARTICIPANT_TOKEN_LEN: usize = 16;
pub const MAX_PARTICIPANT_TOKEN_LEN: usize = 64;

/// Who submitted a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Respondent {
    /// Signed-in user.
    User(Uuid),
    /// Audience member identified by a client-generated participant token.
    Anonymous(String),
}

impl Respondent {
    /// Build an anonymous respondent, validating the token shape.
    pub fn anonymous(token: &str) -> Result<Self> {
        let valid_len =
            (MIN_PARTICIPANT_TOKEN_LEN..=MAX_PARTICIPANT_TOKEN_LEN).contains(&token.len());
        let valid_chars = token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid_len || !valid_chars {
            return Err(DomainError::unauthorized("invalid participant token"));
        }
        Ok(Respondent::Anonymous(token.to_string()))
    }

    /// Storage key: `user:<uuid>` or `anon:<token>`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse a storage key written by `key()`.
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(id) = key.strip_prefix("user:") {
            return Uuid::parse_str(id).ok().map(Respondent::User);
        }
        key.strip_prefix("anon:")
            .map(|token| Respondent::Anonymous(token.to_string()))
    }
}

impl fmt::Display for Respondent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Respondent::User(id) => write!(f, "user:{}", id),
            Respondent::Anonymous(token) => write!(f, "anon:{}", token),
        }
    }
}

/// Answer payload, shape depends on the activity kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseAnswer {
    /// Selected option indices for a multiple-choice activity.
    Choice { selected: Vec<u32> },
    /// Item indices in the respondent's preferred order.
    Ranking { order: Vec<u32> },
    /// Free text.
    Text { text: String },
}

impl ResponseAnswer {
    /// Check this answer fits the activity it is submitted to.
    pub fn validate_for(&self, kind: &ActivityKind) -> Result<()> {
        match (kind, self) {
            (
                ActivityKind::MultipleChoice {
                    options,
                    allow_multiple,
                    ..
                },
                ResponseAnswer::Choice { selected },
            ) => {
                if selected.is_empty() {
                    return Err(DomainError::invalid("at least one option must be selected"));
                }
                if !allow_multiple && selected.len() != 1 {
                    return Err(DomainError::invalid("exactly one option must be selected"));
                }
                if selected.iter().any(|&i| i as usize >= options.len()) {
                    return Err(DomainError::invalid("selected option is out of range"));
                }
                if has_duplicates(selected) {
                    return Err(DomainError::invalid("options may only be selected once"));
                }
                Ok(())
            }
            (ActivityKind::Ranking { items, .. }, ResponseAnswer::Ranking { order }) => {
                let is_permutation = order.len() == items.len()
                    && order.iter().all(|&i| (i as usize) < items.len())
                    && !has_duplicates(order);
                if !is_permutation {
                    return Err(DomainError::invalid("ranking must order every item exactly once"));
                }
                Ok(())
            }
            (ActivityKind::FreeResponse { max_length, .. }, ResponseAnswer::Text { text }) => {
                if text.trim().is_empty() {
                    return Err(DomainError::invalid("answer must not be empty"));
                }
                let limit = max_length.unwrap_or(DEFAULT_FREE_RESPONSE_MAX_LENGTH) as usize;
                if text.chars().count() > limit {
                    return Err(DomainError::invalid(format!(
                        "answer must be at most {} characters",
                        limit
                    )));
                }
                Ok(())
            }
            (kind, _) if !kind.accepts_responses() => Err(DomainError::invalid(format!(
                "{} activities do not accept responses",
                kind.type_name()
            ))),
            (kind, _) => Err(DomainError::invalid(format!(
                "answer does not match a {} activity",
                kind.type_name()
            ))),
        }
    }
}

fn has_duplicates(values: &[u32]) -> bool {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values.iter().any(|v| !seen.insert(*v))
}

/// A stored response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub respondent: Respondent,
    pub answer: ResponseAnswer,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated results for an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityResults {
    /// Vote count per option.
    Choice { counts: Vec<u64>, total: u64 },
    /// Mean 0-based position per item (lower is better).
    Ranking { average_position: Vec<f64>, total: u64 },
    /// All text answers in submission order.
    Text { answers: Vec<String>, total: u64 },
    /// Activity does not collect responses.
    None,
}

impl ActivityResults {
    /// Aggregate responses for an activity. Answers that do not match the
    /// activity's current shape (e.g. options were edited) are skipped.
    pub fn aggregate(kind: &ActivityKind, responses: &[ActivityResponse]) -> Self {
        match kind {
            ActivityKind::MultipleChoice { options, .. } => {
                let mut counts = vec![0u64; options.len()];
                let mut total = 0;
                for response in responses {
                    if let ResponseAnswer::Choice { selected } = &response.answer {
                        total += 1;
                        for &i in selected {
                            if let Some(c) = counts.get_mut(i as usize) {
                                *c += 1;
                            }
                        }
                    }
                }
                ActivityResults::Choice { counts, total }
            }
            ActivityKind::Ranking { items, .. } => {
                let mut sums = vec![0u64; items.len()];
                let mut total = 0u64;
                for response in responses {
                    if let ResponseAnswer::Ranking { order } = &response.answer {
                        if order.len() != items.len() {
                            continue;
                        }
                        total += 1;
                        for (position, &item) in order.iter().enumerate() {
                            if let Some(s) = sums.get_mut(item as usize) {
                                *s += position as u64;
                            }
                        }
                    }
                }
                let average_position = sums
                    .into_iter()
                    .map(|s| if total == 0 { 0.0 } else { s as f64 / total as f64 })
                    .collect();
                ActivityResults::Ranking {
                    average_position,
                    total,
                }
            }
            ActivityKind::FreeResponse { .. } => {
                let mut sorted: Vec<&ActivityResponse> = responses.iter().collect();
                sorted.sort_by_key(|r| r.created_at);
                let answers: Vec<String> = sorted
                    .into_iter()
                    .filter_map(|r| match &r.answer {
                        ResponseAnswer::Text { text } => Some(text.clone()),
                        _ => None,
                    })
                    .collect();
                let total = answers.len() as u64;
                ActivityResults::Text { answers, total }
            }
            _ => ActivityResults::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(allow_multiple: bool) -> ActivityKind {
        ActivityKind::MultipleChoice {
            question: "Favourite?".into(),
            options: vec!["red".into(), "green".into(), "blue".into()],
            allow_multiple,
        }
    }

    fn ranking() -> ActivityKind {
        ActivityKind::Ranking {
            question: "Order these".into(),
            items: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    fn response(answer: ResponseAnswer, offset_secs: i64) -> ActivityResponse {
        let ts = Utc::now() + Duration::seconds(offset_secs);
        ActivityResponse {
            id: Uuid::now_v7(),
            activity_id: Uuid::nil(),
            respondent: Respondent::User(Uuid::now_v7()),
            answer,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_respondent_key_roundtrip() {
        let user = Respondent::User(Uuid::now_v7());
        assert_eq!(Respondent::from_key(&user.key()), Some(user.clone()));
        let anon = Respondent::anonymous("abcdefghijklmnop").unwrap();
        assert_eq!(anon.key(), "anon:abcdefghijklmnop");
        assert_eq!(Respondent::from_key(&anon.key()), Some(anon));
        assert_eq!(Respondent::from_key("bogus"), None);
    }

    #[test]
    fn test_anonymous_token_validation() {
        assert!(Respondent::anonymous("short").is_err());
        assert!(Respondent::anonymous("has spaces in the token").is_err());
        assert!(Respondent::anonymous(&"x".repeat(65)).is_err());
        assert!(Respondent::anonymous("participant_0123-abcd").is_ok());
    }

    #[test]
    fn test_choice_validation() {
        let single = poll(false);
        assert!(ResponseAnswer::Choice { selected: vec![1] }
            .validate_for(&single)
            .is_ok());
        assert!(ResponseAnswer::Choice { selected: vec![0, 1] }
            .validate_for(&single)
            .is_err());
        assert!(ResponseAnswer::Choice { selected: vec![3] }
            .validate_for(&single)
            .is_err());
        assert!(ResponseAnswer::Choice { selected: vec![] }
            .validate_for(&single)
            .is_err());

        let multi = poll(true);
        assert!(ResponseAnswer::Choice { selected: vec![0, 2] }
            .validate_for(&multi)
            .is_ok());
        assert!(ResponseAnswer::Choice { selected: vec![2, 2] }
            .validate_for(&multi)
            .is_err());
    }

    #[test]
    fn test_ranking_must_be_permutation() {
        let kind = ranking();
        assert!(ResponseAnswer::Ranking { order: vec![2, 0, 1] }
            .validate_for(&kind)
            .is_ok());
        assert!(ResponseAnswer::Ranking { order: vec![0, 1] }
            .validate_for(&kind)
            .is_err());
        assert!(ResponseAnswer::Ranking { order: vec![0, 0, 1] }
            .validate_for(&kind)
            .is_err());
        assert!(ResponseAnswer::Ranking { order: vec![0, 1, 5] }
            .validate_for(&kind)
            .is_err());
    }

    #[test]
    fn test_text_validation() {
        let kind = ActivityKind::FreeResponse {
            question: "Thoughts?".into(),
            max_length: Some(5),
        };
        assert!(ResponseAnswer::Text { text: "hello".into() }
            .validate_for(&kind)
            .is_ok());
        assert!(ResponseAnswer::Text { text: "hello!".into() }
            .validate_for(&kind)
            .is_err());
        assert!(ResponseAnswer::Text { text: "   ".into() }
            .validate_for(&kind)
            .is_err());
    }

    #[test]
    fn test_mismatched_answer_rejected() {
        assert!(ResponseAnswer::Text { text: "hi".into() }
            .validate_for(&poll(false))
            .is_err());
        let err = ResponseAnswer::Text { text: "hi".into() }
            .validate_for(&ActivityKind::Welcome { title: None })
            .unwrap_err();
        assert!(err.to_string().contains("do not accept responses"));
    }

    #[test]
    fn test_aggregate_choice() {
        let responses = vec![
            response(ResponseAnswer::Choice { selected: vec![0] }, 0),
            response(ResponseAnswer::Choice { selected: vec![2] }, 1),
            response(ResponseAnswer::Choice { selected: vec![2] }, 2),
        ];
        assert_eq!(
            ActivityResults::aggregate(&poll(false), &responses),
            ActivityResults::Choice {
                counts: vec![1, 0, 2],
                total: 3
            }
        );
    }

    #[test]
    fn test_aggregate_ranking() {
        let responses = vec![
            response(ResponseAnswer::Ranking { order: vec![0, 1, 2] }, 0),
            response(ResponseAnswer::Ranking { order: vec![1, 0, 2] }, 1),
        ];
        match ActivityResults::aggregate(&ranking(), &responses) {
            ActivityResults::Ranking {
                average_position,
                total,
            } => {
                assert_eq!(total, 2);
                assert_eq!(average_position, vec![0.5, 0.5, 2.0]);
            }
            other => panic!("unexpected results: {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_ranking_empty() {
        assert_eq!(
            ActivityResults::aggregate(&ranking(), &[]),
            ActivityResults::Ranking {
                average_position: vec![0.0, 0.0, 0.0],
                total: 0
            }
        );
    }

    #[test]
    fn test_aggregate_text_in_submission_order() {
        let kind = ActivityKind::FreeResponse {
            question: "q".into(),
            max_length: None,
        };
        let responses = vec![
            response(ResponseAnswer::Text { text: "second".into() }, 10),
            response(ResponseAnswer::Text { text: "first".into() }, 0),
        ];
        assert_eq!(
            ActivityResults::aggregate(&kind, &responses),
            ActivityResults::Text {
                answers: vec!["first".into(), "second".into()],
                total: 2
            }
        );
    }

    #[test]
    fn test_aggregate_non_interactive() {
        assert_eq!(
            ActivityResults::aggregate(&ActivityKind::ThankYou { message: None }, &[]),
            ActivityResults::None
        );
    }
}
