// Services layer for business logic
// Services own business logic and validation, calling storage directly and
// publishing live notifications once a mutation has been persisted.

pub mod activity;
pub mod event;
pub mod response;

pub use activity::ActivityService;
pub use event::EventService;
pub use response::ActivityResponseService;

use crowdpulse_core::{Activity, DomainError, Event, Result};
use uuid::Uuid;

use crate::storage::StorageBackend;

/// Load an active event and check `user_id` owns it.
pub(crate) async fn owned_event(db: &StorageBackend, user_id: Uuid, event_id: Uuid) -> Result<Event> {
    let row = db
        .get_event(event_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Event"))?;
    let event = EventService::row_to_event(row)?;
    if !event.is_owned_by(user_id) {
        return Err(DomainError::forbidden("event belongs to another user"));
    }
    Ok(event)
}

/// Load an activity together with its (active) event.
pub(crate) async fn activity_with_event(
    db: &StorageBackend,
    activity_id: Uuid,
) -> Result<(Activity, Event)> {
    let row = db
        .get_activity(activity_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Activity"))?;
    let activity = ActivityService::row_to_activity(row)?;
    // Activities of a soft-deleted event are gone as far as callers can tell
    let event_row = db
        .get_event(activity.event_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Activity"))?;
    Ok((activity, EventService::row_to_event(event_row)?))
}
