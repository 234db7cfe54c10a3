// Activity domain types
//
// Activities are the slides of an event. The kind is a closed tagged enum;
// only interactive kinds (multiple choice, ranking, free response) accept
// audience responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{DomainError, Result};

/// Maximum bytes for a question, title or message field.
pub const MAX_QUESTION_BYTES: usize = 1000;

/// Maximum bytes for markdown content.
pub const MAX_MARKDOWN_BYTES: usize = 64 * 1024;

/// Minimum and maximum options for choice and ranking activities.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 20;

/// Maximum bytes for a single option or item label.
pub const MAX_OPTION_BYTES: usize = 200;

/// Default cap on free-response answers, in characters.
pub const DEFAULT_FREE_RESPONSE_MAX_LENGTH: u32 = 1000;

/// Hard upper bound a presenter may configure for free-response answers.
pub const MAX_FREE_RESPONSE_MAX_LENGTH: u32 = 10_000;

/// Type-specific activity payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    /// Opening slide.
    Welcome {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Static markdown content.
    Markdown { content: String },
    /// Embedded external page.
    Iframe { url: String },
    /// Poll with one or more selectable options.
    MultipleChoice {
        question: String,
        options: Vec<String>,
        #[serde(default)]
        allow_multiple: bool,
    },
    /// Audience orders the items.
    Ranking { question: String, items: Vec<String> },
    /// Open text answers.
    FreeResponse {
        question: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
    },
    /// Closing slide.
    ThankYou {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ActivityKind {
    /// Snake-case discriminator, as stored in the `kind` column.
    pub fn type_name(&self) -> &'static str {
        match self {
            ActivityKind::Welcome { .. } => "welcome",
            ActivityKind::Markdown { .. } => "markdown",
            ActivityKind::Iframe { .. } => "iframe",
            ActivityKind::MultipleChoice { .. } => "multiple_choice",
            ActivityKind::Ranking { .. } => "ranking",
            ActivityKind::FreeResponse { .. } => "free_response",
            ActivityKind::ThankYou { .. } => "thank_you",
        }
    }

    /// Whether the audience can submit responses to this activity.
    pub fn accepts_responses(&self) -> bool {
        matches!(
            self,
            ActivityKind::MultipleChoice { .. }
                | ActivityKind::Ranking { .. }
                | ActivityKind::FreeResponse { .. }
        )
    }

    /// Check the payload's semantic constraints.
    pub fn validate(&self) -> Result<()> {
        match self {
            ActivityKind::Welcome { title } => validate_optional_text("title", title.as_deref()),
            ActivityKind::Markdown { content } => {
                if content.len() > MAX_MARKDOWN_BYTES {
                    return Err(DomainError::invalid("markdown content is too long"));
                }
                Ok(())
            }
            ActivityKind::Iframe { url } => validate_iframe_url(url),
            ActivityKind::MultipleChoice {
                question, options, ..
            } => {
                validate_question(question)?;
                validate_labels("options", options)
            }
            ActivityKind::Ranking { question, items } => {
                validate_question(question)?;
                validate_labels("items", items)
            }
            ActivityKind::FreeResponse {
                question,
                max_length,
            } => {
                validate_question(question)?;
                match max_length {
                    Some(0) => Err(DomainError::invalid("max_length must be positive")),
                    Some(n) if *n > MAX_FREE_RESPONSE_MAX_LENGTH => Err(DomainError::invalid(
                        format!("max_length must be at most {}", MAX_FREE_RESPONSE_MAX_LENGTH),
                    )),
                    _ => Ok(()),
                }
            }
            ActivityKind::ThankYou { message } => {
                validate_optional_text("message", message.as_deref())
            }
        }
    }
}

fn validate_question(question: &str) -> Result<()> {
    if question.trim().is_empty() {
        return Err(DomainError::invalid("question must not be empty"));
    }
    if question.len() > MAX_QUESTION_BYTES {
        return Err(DomainError::invalid("question is too long"));
    }
    Ok(())
}

fn validate_optional_text(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.len() > MAX_QUESTION_BYTES => {
            Err(DomainError::invalid(format!("{} is too long", field)))
        }
        _ => Ok(()),
    }
}

fn validate_labels(field: &str, labels: &[String]) -> Result<()> {
    if labels.len() < MIN_OPTIONS || labels.len() > MAX_OPTIONS {
        return Err(DomainError::invalid(format!(
            "{} must have between {} and {} entries",
            field, MIN_OPTIONS, MAX_OPTIONS
        )));
    }
    if labels.iter().any(|l| l.trim().is_empty()) {
        return Err(DomainError::invalid(format!("{} must not be empty", field)));
    }
    if labels.iter().any(|l| l.len() > MAX_OPTION_BYTES) {
        return Err(DomainError::invalid(format!("{} entry is too long", field)));
    }
    Ok(())
}

fn validate_iframe_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw).map_err(|_| DomainError::invalid("url is not valid"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DomainError::invalid(format!(
            "url scheme '{}' is not allowed",
            other
        ))),
    }
}

/// A single activity within an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Activity {
    pub id: Uuid,
    pub event_id: Uuid,
    /// 0-based position within the event.
    pub position: i32,
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
