// Database models (internal, may differ from public DTOs)
//
// Activity payloads and answers are stored as JSON next to a plain-text
// discriminator so rows stay queryable without decoding the payload.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Events
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub short_code: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub active_activity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CreateEventRow {
    pub short_code: String,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// Partial update. `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct UpdateEventRow {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
}

// ============================================
// Activities
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub position: i32,
    pub kind: String,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityRow {
    pub event_id: Uuid,
    pub kind: String,
    pub content: serde_json::Value,
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ActivityResponseRow {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub respondent_key: String,
    pub answer: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertResponseRow {
    pub activity_id: Uuid,
    pub respondent_key: String,
    pub answer: serde_json::Value,
}
