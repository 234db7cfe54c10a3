// Event domain types
//
// An Event is what a presenter runs and an audience joins by short code.
// Events are soft-deleted; a deleted event's short code becomes reusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::short_code::ShortCode;

/// Event owned by a presenter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Event {
    /// Unique identifier for the event.
    pub id: Uuid,
    /// Code audiences type to join.
    pub short_code: ShortCode,
    /// Display title.
    pub title: String,
    /// Optional longer description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// User who owns the event.
    pub owner_id: Uuid,
    /// Activity the presenter is currently showing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_activity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the event is soft-deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn to_public(&self) -> PublicEvent {
        PublicEvent {
            id: self.id,
            short_code: self.short_code.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            active_activity_id: self.active_activity_id,
        }
    }
}

/// Audience-facing view of an event (no owner or lifecycle fields).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PublicEvent {
    pub id: Uuid,
    pub short_code: ShortCode,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_activity_id: Option<Uuid>,
}
