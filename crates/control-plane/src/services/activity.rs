// Activity service
//
// Activities are ordered by `position` within their event. Every mutation is
// followed by a notification on the event's short code.

use crowdpulse_core::{Activity, ActivityKind, DomainError, Event, Notification, Result, ShortCode};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::realtime::ConnectionRegistry;
use crate::storage::{ActivityRow, CreateActivityRow, StorageBackend};

use super::EventService;

pub struct ActivityService {
    db: Arc<StorageBackend>,
    registry: Arc<ConnectionRegistry>,
}

impl ActivityService {
    pub fn new(db: Arc<StorageBackend>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { db, registry }
    }

    /// Append an activity to the end of the event
    pub async fn create(&self, user_id: Uuid, event_id: Uuid, kind: ActivityKind) -> Result<Activity> {
        let event = super::owned_event(&self.db, user_id, event_id).await?;
        kind.validate()?;

        let input = CreateActivityRow {
            event_id,
            kind: kind.type_name().to_string(),
            content: serde_json::to_value(&kind)?,
        };
        let activity = Self::row_to_activity(self.db.create_activity(input).await?)?;
        tracing::debug!(
            event_id = %event_id,
            activity_id = %activity.id,
            kind = activity.kind.type_name(),
            position = activity.position,
            "Activity created"
        );

        self.registry.publish(
            &event.short_code,
            &Notification::ActivityCreated {
                event_id,
                activity_id: activity.id,
            },
        );
        Ok(activity)
    }

    /// Presenter view of an event's activities
    pub async fn list(&self, user_id: Uuid, event_id: Uuid) -> Result<Vec<Activity>> {
        super::owned_event(&self.db, user_id, event_id).await?;
        self.list_for_event(event_id).await
    }

    /// Audience view: activities of the active event holding `short_code`
    pub async fn list_by_short_code(&self, short_code: &ShortCode) -> Result<Vec<Activity>> {
        let event = self.event_by_short_code(short_code).await?;
        self.list_for_event(event.id).await
    }

    pub async fn get(&self, activity_id: Uuid) -> Result<Activity> {
        let (activity, _) = super::activity_with_event(&self.db, activity_id).await?;
        Ok(activity)
    }

    /// Replace the activity payload. The activity type is fixed at creation.
    pub async fn update(&self, user_id: Uuid, activity_id: Uuid, kind: ActivityKind) -> Result<Activity> {
        let (activity, event) = self.owned_activity(user_id, activity_id).await?;
        if activity.kind.type_name() != kind.type_name() {
            return Err(DomainError::invalid(format!(
                "cannot change activity type from {} to {}",
                activity.kind.type_name(),
                kind.type_name()
            )));
        }
        kind.validate()?;

        let row = self
            .db
            .update_activity_content(activity_id, serde_json::to_value(&kind)?)
            .await?
            .ok_or_else(|| DomainError::not_found("Activity"))?;
        let activity = Self::row_to_activity(row)?;

        self.registry.publish(
            &event.short_code,
            &Notification::ActivityUpdated {
                event_id: event.id,
                activity_id,
            },
        );
        Ok(activity)
    }

    pub async fn delete(&self, user_id: Uuid, activity_id: Uuid) -> Result<()> {
        let (_, event) = self.owned_activity(user_id, activity_id).await?;
        if !self.db.delete_activity(activity_id).await? {
            return Err(DomainError::not_found("Activity"));
        }

        self.registry.publish(
            &event.short_code,
            &Notification::ActivityDeleted {
                event_id: event.id,
                activity_id,
            },
        );
        Ok(())
    }

    /// Set the order of every activity of the event. `activity_ids` must be a
    /// permutation of the event's current activities.
    pub async fn reorder(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        activity_ids: Vec<Uuid>,
    ) -> Result<Vec<Activity>> {
        let event = super::owned_event(&self.db, user_id, event_id).await?;
        let current = self.db.list_activities(event_id).await?;

        let current_ids: HashSet<Uuid> = current.iter().map(|a| a.id).collect();
        let requested: HashSet<Uuid> = activity_ids.iter().copied().collect();
        if requested.len() != activity_ids.len() || requested != current_ids {
            return Err(DomainError::invalid(
                "activity_ids must list every activity of the event exactly once",
            ));
        }

        let rows = self.db.reorder_activities(event_id, &activity_ids).await?;
        let activities = rows
            .into_iter()
            .map(Self::row_to_activity)
            .collect::<Result<Vec<_>>>()?;

        self.registry.publish(
            &event.short_code,
            &Notification::ActivitiesReordered {
                event_id,
                activity_ids,
            },
        );
        Ok(activities)
    }

    async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Activity>> {
        let rows = self.db.list_activities(event_id).await?;
        rows.into_iter().map(Self::row_to_activity).collect()
    }

    async fn event_by_short_code(&self, short_code: &ShortCode) -> Result<Event> {
        let row = self
            .db
            .get_event_by_short_code(short_code.as_str())
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        EventService::row_to_event(row)
    }

    async fn owned_activity(&self, user_id: Uuid, activity_id: Uuid) -> Result<(Activity, Event)> {
        let (activity, event) = super::activity_with_event(&self.db, activity_id).await?;
        if !event.is_owned_by(user_id) {
            return Err(DomainError::forbidden("activity belongs to another user's event"));
        }
        Ok((activity, event))
    }

    pub(crate) fn row_to_activity(row: ActivityRow) -> Result<Activity> {
        let kind: ActivityKind = serde_json::from_value(row.content)?;
        Ok(Activity {
            id: row.id,
            event_id: row.event_id,
            position: row.position,
            kind,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
