// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// Mirrors the PostgreSQL repository API on top of HashMaps so the
// control-plane runs without a database. Data is lost on restart.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;
use super::ShortCodeTaken;

#[derive(Default)]
pub struct InMemoryDatabase {
    events: RwLock<HashMap<Uuid, EventRow>>,
    activities: RwLock<HashMap<Uuid, ActivityRow>>,
    // Keyed by (activity_id, respondent_key), the natural uniqueness constraint
    responses: RwLock<HashMap<(Uuid, String), ActivityResponseRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEventRow) -> Result<EventRow> {
        let mut events = self.events.write();
        if short_code_in_use(&events, &input.short_code) {
            return Err(ShortCodeTaken(input.short_code).into());
        }

        let now = Self::now();
        let row = EventRow {
            id: Uuid::now_v7(),
            short_code: input.short_code,
            title: input.title,
            description: input.description,
            owner_id: input.owner_id,
            active_activity_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        events.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        Ok(self
            .events
            .read()
            .get(&id)
            .filter(|e| e.deleted_at.is_none())
            .cloned())
    }

    pub async fn get_event_by_short_code(&self, short_code: &str) -> Result<Option<EventRow>> {
        Ok(self
            .events
            .read()
            .values()
            .find(|e| e.deleted_at.is_none() && e.short_code == short_code)
            .cloned())
    }

    pub async fn list_events_for_owner(&self, owner_id: Uuid) -> Result<Vec<EventRow>> {
        let mut rows: Vec<EventRow> = self
            .events
            .read()
            .values()
            .filter(|e| e.owner_id == owner_id && e.deleted_at.is_none())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    pub async fn update_event(&self, id: Uuid, input: UpdateEventRow) -> Result<Option<EventRow>> {
        let mut events = self.events.write();
        let Some(event) = events.get_mut(&id).filter(|e| e.deleted_at.is_none()) else {
            return Ok(None);
        };
        if let Some(title) = input.title {
            event.title = title;
        }
        if let Some(description) = input.description {
            event.description = description;
        }
        event.updated_at = Self::now();
        Ok(Some(event.clone()))
    }

    pub async fn set_event_short_code(
        &self,
        id: Uuid,
        short_code: &str,
    ) -> Result<Option<EventRow>> {
        let mut events = self.events.write();
        let taken = events
            .values()
            .any(|e| e.id != id && e.deleted_at.is_none() && e.short_code == short_code);
        if taken {
            return Err(ShortCodeTaken(short_code.to_string()).into());
        }
        let Some(event) = events.get_mut(&id).filter(|e| e.deleted_at.is_none()) else {
            return Ok(None);
        };
        event.short_code = short_code.to_string();
        event.updated_at = Self::now();
        Ok(Some(event.clone()))
    }

    pub async fn set_active_activity(
        &self,
        id: Uuid,
        activity_id: Option<Uuid>,
    ) -> Result<Option<EventRow>> {
        let mut events = self.events.write();
        let Some(event) = events.get_mut(&id).filter(|e| e.deleted_at.is_none()) else {
            return Ok(None);
        };
        event.active_activity_id = activity_id;
        event.updated_at = Self::now();
        Ok(Some(event.clone()))
    }

    pub async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let mut events = self.events.write();
        match events.get_mut(&id).filter(|e| e.deleted_at.is_none()) {
            Some(event) => {
                let now = Self::now();
                event.deleted_at = Some(now);
                event.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ============================================
    // Activities
    // ============================================

    pub async fn create_activity(&self, input: CreateActivityRow) -> Result<ActivityRow> {
        let mut activities = self.activities.write();
        let position = activities
            .values()
            .filter(|a| a.event_id == input.event_id)
            .count() as i32;

        let now = Self::now();
        let row = ActivityRow {
            id: Uuid::now_v7(),
            event_id: input.event_id,
            position,
            kind: input.kind,
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        activities.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Option<ActivityRow>> {
        Ok(self.activities.read().get(&id).cloned())
    }

    pub async fn list_activities(&self, event_id: Uuid) -> Result<Vec<ActivityRow>> {
        Ok(sorted_activities(&self.activities.read(), event_id))
    }

    pub async fn update_activity_content(
        &self,
        id: Uuid,
        content: serde_json::Value,
    ) -> Result<Option<ActivityRow>> {
        let mut activities = self.activities.write();
        let Some(activity) = activities.get_mut(&id) else {
            return Ok(None);
        };
        activity.content = content;
        activity.updated_at = Self::now();
        Ok(Some(activity.clone()))
    }

    pub async fn delete_activity(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut activities = self.activities.write();
            let Some(removed) = activities.remove(&id) else {
                return Ok(false);
            };
            for activity in activities.values_mut() {
                if activity.event_id == removed.event_id && activity.position > removed.position {
                    activity.position -= 1;
                }
            }
            removed
        };

        self.responses.write().retain(|(activity_id, _), _| *activity_id != id);

        let mut events = self.events.write();
        if let Some(event) = events.get_mut(&removed.event_id) {
            if event.active_activity_id == Some(id) {
                event.active_activity_id = None;
                event.updated_at = Self::now();
            }
        }
        Ok(true)
    }

    pub async fn reorder_activities(
        &self,
        event_id: Uuid,
        activity_ids: &[Uuid],
    ) -> Result<Vec<ActivityRow>> {
        let mut activities = self.activities.write();
        let now = Self::now();
        for (position, id) in activity_ids.iter().enumerate() {
            if let Some(activity) = activities.get_mut(id).filter(|a| a.event_id == event_id) {
                activity.position = position as i32;
                activity.updated_at = now;
            }
        }
        Ok(sorted_activities(&activities, event_id))
    }

    // ============================================
    // Responses
    // ============================================

    pub async fn upsert_response(&self, input: UpsertResponseRow) -> Result<ActivityResponseRow> {
        let now = Self::now();
        let mut responses = self.responses.write();
        let key = (input.activity_id, input.respondent_key);
        let row = match responses.get_mut(&key) {
            Some(existing) => {
                existing.answer = input.answer;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let row = ActivityResponseRow {
                    id: Uuid::now_v7(),
                    activity_id: key.0,
                    respondent_key: key.1.clone(),
                    answer: input.answer,
                    created_at: now,
                    updated_at: now,
                };
                responses.insert(key, row.clone());
                row
            }
        };
        Ok(row)
    }

    pub async fn get_response(
        &self,
        activity_id: Uuid,
        respondent_key: &str,
    ) -> Result<Option<ActivityResponseRow>> {
        Ok(self
            .responses
            .read()
            .get(&(activity_id, respondent_key.to_string()))
            .cloned())
    }

    pub async fn list_responses(&self, activity_id: Uuid) -> Result<Vec<ActivityResponseRow>> {
        let mut rows: Vec<ActivityResponseRow> = self
            .responses
            .read()
            .values()
            .filter(|r| r.activity_id == activity_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    pub async fn delete_responses(&self, activity_id: Uuid) -> Result<u64> {
        let mut responses = self.responses.write();
        let before = responses.len();
        responses.retain(|(id, _), _| *id != activity_id);
        Ok((before - responses.len()) as u64)
    }
}

fn short_code_in_use(events: &HashMap<Uuid, EventRow>, short_code: &str) -> bool {
    events
        .values()
        .any(|e| e.deleted_at.is_none() && e.short_code == short_code)
}

fn sorted_activities(activities: &HashMap<Uuid, ActivityRow>, event_id: Uuid) -> Vec<ActivityRow> {
    let mut rows: Vec<ActivityRow> = activities
        .values()
        .filter(|a| a.event_id == event_id)
        .cloned()
        .collect();
    rows.sort_by_key(|a| a.position);
    rows
}
