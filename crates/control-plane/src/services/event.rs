// Event service
//
// Presenter-side event lifecycle: create, update, soft delete, short-code
// regeneration and the presenter's active activity.

use crowdpulse_core::{DomainError, Event, Notification, Result, ShortCode};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::events::{CreateEventRequest, UpdateEventRequest};
use crate::realtime::ConnectionRegistry;
use crate::storage::{CreateEventRow, EventRow, ShortCodeTaken, StorageBackend, UpdateEventRow};

pub struct EventService {
    db: Arc<StorageBackend>,
    registry: Arc<ConnectionRegistry>,
    short_code_max_attempts: u32,
}

impl EventService {
    pub fn new(
        db: Arc<StorageBackend>,
        registry: Arc<ConnectionRegistry>,
        short_code_max_attempts: u32,
    ) -> Self {
        Self {
            db,
            registry,
            short_code_max_attempts: short_code_max_attempts.max(1),
        }
    }

    pub async fn create(&self, owner_id: Uuid, req: CreateEventRequest) -> Result<Event> {
        for attempt in 1..=self.short_code_max_attempts {
            let short_code = match self.free_short_code().await? {
                Some(code) => code,
                None => continue,
            };
            let input = CreateEventRow {
                short_code: short_code.to_string(),
                title: req.title.clone(),
                description: req.description.clone(),
                owner_id,
            };
            match self.db.create_event(input).await {
                Ok(row) => {
                    let event = Self::row_to_event(row)?;
                    tracing::info!(
                        event_id = %event.id,
                        short_code = %event.short_code,
                        owner_id = %owner_id,
                        "Event created"
                    );
                    return Ok(event);
                }
                Err(e) if e.is::<ShortCodeTaken>() => {
                    tracing::debug!(attempt, error = %e, "Short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::internal("could not allocate a unique short code"))
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Event> {
        super::owned_event(&self.db, user_id, id).await
    }

    /// Active event by short code, for audiences
    pub async fn get_by_short_code(&self, short_code: &ShortCode) -> Result<Event> {
        let row = self
            .db
            .get_event_by_short_code(short_code.as_str())
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        Self::row_to_event(row)
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<Event>> {
        let rows = self.db.list_events_for_owner(owner_id).await?;
        rows.into_iter().map(Self::row_to_event).collect()
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, req: UpdateEventRequest) -> Result<Event> {
        super::owned_event(&self.db, user_id, id).await?;
        let input = UpdateEventRow {
            title: req.title,
            description: req.description,
        };
        let row = self
            .db
            .update_event(id, input)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        let event = Self::row_to_event(row)?;

        self.registry
            .publish(&event.short_code, &Notification::EventUpdated { event_id: id });
        Ok(event)
    }

    /// Soft delete, then disconnect everyone watching the event
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let event = super::owned_event(&self.db, user_id, id).await?;
        if !self.db.delete_event(id).await? {
            return Err(DomainError::not_found("Event"));
        }
        tracing::info!(event_id = %id, short_code = %event.short_code, "Event deleted");

        self.registry
            .publish(&event.short_code, &Notification::EventDeleted { event_id: id });
        self.registry.close_all(&event.short_code);
        Ok(())
    }

    /// Give the event a fresh short code. Clients on the old code are told
    /// and then disconnected; they must rejoin with the new code.
    pub async fn regenerate_short_code(&self, user_id: Uuid, id: Uuid) -> Result<Event> {
        let old = super::owned_event(&self.db, user_id, id).await?;

        for attempt in 1..=self.short_code_max_attempts {
            let short_code = match self.free_short_code().await? {
                Some(code) => code,
                None => continue,
            };
            match self.db.set_event_short_code(id, short_code.as_str()).await {
                Ok(Some(row)) => {
                    let event = Self::row_to_event(row)?;
                    tracing::info!(
                        event_id = %id,
                        old_short_code = %old.short_code,
                        short_code = %event.short_code,
                        "Short code regenerated"
                    );
                    self.registry
                        .publish(&old.short_code, &Notification::EventUpdated { event_id: id });
                    self.registry.close_all(&old.short_code);
                    return Ok(event);
                }
                Ok(None) => return Err(DomainError::not_found("Event")),
                Err(e) if e.is::<ShortCodeTaken>() => {
                    tracing::debug!(attempt, error = %e, "Short code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::internal("could not allocate a unique short code"))
    }

    /// Point the audience at `activity_id`, or at nothing
    pub async fn set_active_activity(
        &self,
        user_id: Uuid,
        id: Uuid,
        activity_id: Option<Uuid>,
    ) -> Result<Event> {
        super::owned_event(&self.db, user_id, id).await?;

        if let Some(activity_id) = activity_id {
            let belongs = self
                .db
                .get_activity(activity_id)
                .await?
                .is_some_and(|a| a.event_id == id);
            if !belongs {
                return Err(DomainError::invalid("activity does not belong to this event"));
            }
        }

        let row = self
            .db
            .set_active_activity(id, activity_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        let event = Self::row_to_event(row)?;

        self.registry.publish(
            &event.short_code,
            &Notification::PresenterChanged {
                event_id: id,
                active_activity_id: activity_id,
            },
        );
        Ok(event)
    }

    /// Generate a code not held by any active event. `None` means the
    /// candidate was taken and the caller should try again.
    async fn free_short_code(&self) -> Result<Option<ShortCode>> {
        let candidate = ShortCode::generate();
        let taken = self
            .db
            .get_event_by_short_code(candidate.as_str())
            .await?
            .is_some();
        Ok((!taken).then_some(candidate))
    }

    pub(crate) fn row_to_event(row: EventRow) -> Result<Event> {
        let short_code = ShortCode::parse(&row.short_code)
            .map_err(|e| DomainError::internal(format!("stored event {}: {}", row.id, e)))?;
        Ok(Event {
            id: row.id,
            short_code,
            title: row.title,
            description: row.description,
            owner_id: row.owner_id,
            active_activity_id: row.active_activity_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}
