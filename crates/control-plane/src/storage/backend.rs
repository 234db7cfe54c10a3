// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Connect to PostgreSQL and apply pending migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Short label for health output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::InMemory(_) => "memory",
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.create_event(input).await,
            Self::InMemory(db) => db.create_event(input).await,
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.get_event(id).await,
            Self::InMemory(db) => db.get_event(id).await,
        }
    }

    pub async fn get_event_by_short_code(&self, short_code: &str) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.get_event_by_short_code(short_code).await,
            Self::InMemory(db) => db.get_event_by_short_code(short_code).await,
        }
    }

    pub async fn list_events_for_owner(&self, owner_id: Uuid) -> Result<Vec<EventRow>> {
        match self {
            Self::Postgres(db) => db.list_events_for_owner(owner_id).await,
            Self::InMemory(db) => db.list_events_for_owner(owner_id).await,
        }
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEventRow) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.update_event(id, input).await,
            Self::InMemory(db) => db.update_event(id, input).await,
        }
    }

    pub async fn set_event_short_code(
        &self,
        id: Uuid,
        short_code: &str,
    ) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.set_event_short_code(id, short_code).await,
            Self::InMemory(db) => db.set_event_short_code(id, short_code).await,
        }
    }

    pub async fn set_active_activity(
        &self,
        id: Uuid,
        activity_id: Option<Uuid>,
    ) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.set_active_activity(id, activity_id).await,
            Self::InMemory(db) => db.set_active_activity(id, activity_id).await,
        }
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_event(id).await,
            Self::InMemory(db) => db.delete_event(id).await,
        }
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn create_activity(&self, input: CreateActivityRow) -> Result<ActivityRow> {
        match self {
            Self::Postgres(db) => db.create_activity(input).await,
            Self::InMemory(db) => db.create_activity(input).await,
        }
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Option<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.get_activity(id).await,
            Self::InMemory(db) => db.get_activity(id).await,
        }
    }

    pub async fn list_activities(&self, event_id: Uuid) -> Result<Vec<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.list_activities(event_id).await,
            Self::InMemory(db) => db.list_activities(event_id).await,
        }
    }

    pub async fn update_activity_content(
        &self,
        id: Uuid,
        content: serde_json::Value,
    ) -> Result<Option<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.update_activity_content(id, content).await,
            Self::InMemory(db) => db.update_activity_content(id, content).await,
        }
    }

    pub async fn delete_activity(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_activity(id).await,
            Self::InMemory(db) => db.delete_activity(id).await,
        }
    }

    pub async fn reorder_activities(
        &self,
        event_id: Uuid,
        activity_ids: &[Uuid],
    ) -> Result<Vec<ActivityRow>> {
        match self {
            Self::Postgres(db) => db.reorder_activities(event_id, activity_ids).await,
            Self::InMemory(db) => db.reorder_activities(event_id, activity_ids).await,
        }
    }

    // ============================================
    // Responses
    // ============================================

    pub async fn upsert_response(&self, input: UpsertResponseRow) -> Result<ActivityResponseRow> {
        match self {
            Self::Postgres(db) => db.upsert_response(input).await,
            Self::InMemory(db) => db.upsert_response(input).await,
        }
    }

    pub async fn get_response(
        &self,
        activity_id: Uuid,
        respondent_key: &str,
    ) -> Result<Option<ActivityResponseRow>> {
        match self {
            Self::Postgres(db) => db.get_response(activity_id, respondent_key).await,
            Self::InMemory(db) => db.get_response(activity_id, respondent_key).await,
        }
    }

    pub async fn list_responses(&self, activity_id: Uuid) -> Result<Vec<ActivityResponseRow>> {
        match self {
            Self::Postgres(db) => db.list_responses(activity_id).await,
            Self::InMemory(db) => db.list_responses(activity_id).await,
        }
    }

    pub async fn delete_responses(&self, activity_id: Uuid) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_responses(activity_id).await,
            Self::InMemory(db) => db.delete_responses(activity_id).await,
        }
    }
}
