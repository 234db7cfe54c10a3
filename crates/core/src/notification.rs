// Live notifications
//
// Pushed to every open channel of an event after a mutation commits.
// Notifications only reference ids; clients re-fetch what they need.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const ACTIVITY_CREATED: &str = "activity.created";
pub const ACTIVITY_UPDATED: &str = "activity.updated";
pub const ACTIVITY_DELETED: &str = "activity.deleted";
pub const ACTIVITIES_REORDERED: &str = "activities.reordered";
pub const RESPONSE_SUBMITTED: &str = "response.submitted";
pub const RESPONSES_CLEARED: &str = "responses.cleared";
pub const PRESENTER_CHANGED: &str = "presenter.changed";
pub const EVENT_UPDATED: &str = "event.updated";
pub const EVENT_DELETED: &str = "event.deleted";

/// A change to an event that connected clients should know about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(tag = "type")]
pub enum Notification {
    #[serde(rename = "activity.created")]
    ActivityCreated { event_id: Uuid, activity_id: Uuid },
    #[serde(rename = "activity.updated")]
    ActivityUpdated { event_id: Uuid, activity_id: Uuid },
    #[serde(rename = "activity.deleted")]
    ActivityDeleted { event_id: Uuid, activity_id: Uuid },
    #[serde(rename = "activities.reordered")]
    ActivitiesReordered {
        event_id: Uuid,
        activity_ids: Vec<Uuid>,
    },
    #[serde(rename = "response.submitted")]
    ResponseSubmitted {
        event_id: Uuid,
        activity_id: Uuid,
        response_id: Uuid,
    },
    #[serde(rename = "responses.cleared")]
    ResponsesCleared { event_id: Uuid, activity_id: Uuid },
    #[serde(rename = "presenter.changed")]
    PresenterChanged {
        event_id: Uuid,
        active_activity_id: Option<Uuid>,
    },
    #[serde(rename = "event.updated")]
    EventUpdated { event_id: Uuid },
    #[serde(rename = "event.deleted")]
    EventDeleted { event_id: Uuid },
}

impl Notification {
    /// Value of the `type` tag, also used as the SSE `event:` name.
    pub fn event_type(&self) -> &'static str {
        match self {
            Notification::ActivityCreated { .. } => ACTIVITY_CREATED,
            Notification::ActivityUpdated { .. } => ACTIVITY_UPDATED,
            Notification::ActivityDeleted { .. } => ACTIVITY_DELETED,
            Notification::ActivitiesReordered { .. } => ACTIVITIES_REORDERED,
            Notification::ResponseSubmitted { .. } => RESPONSE_SUBMITTED,
            Notification::ResponsesCleared { .. } => RESPONSES_CLEARED,
            Notification::PresenterChanged { .. } => PRESENTER_CHANGED,
            Notification::EventUpdated { .. } => EVENT_UPDATED,
            Notification::EventDeleted { .. } => EVENT_DELETED,
        }
    }

    pub fn event_id(&self) -> Uuid {
        match self {
            Notification::ActivityCreated { event_id, .. }
            | Notification::ActivityUpdated { event_id, .. }
            | Notification::ActivityDeleted { event_id, .. }
            | Notification::ActivitiesReordered { event_id, .. }
            | Notification::ResponseSubmitted { event_id, .. }
            | Notification::ResponsesCleared { event_id, .. }
            | Notification::PresenterChanged { event_id, .. }
            | Notification::EventUpdated { event_id }
            | Notification::EventDeleted { event_id } => *event_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_matches_event_type() {
        let event_id = Uuid::now_v7();
        let activity_id = Uuid::now_v7();
        let notifications = vec![
            Notification::ActivityCreated {
                event_id,
                activity_id,
            },
            Notification::ActivitiesReordered {
                event_id,
                activity_ids: vec![activity_id],
            },
            Notification::PresenterChanged {
                event_id,
                active_activity_id: None,
            },
            Notification::EventDeleted { event_id },
        ];
        for n in notifications {
            let json = serde_json::to_value(&n).unwrap();
            assert_eq!(json["type"], n.event_type());
            assert_eq!(json["event_id"], event_id.to_string());
            assert_eq!(n.event_id(), event_id);
        }
    }

    #[test]
    fn test_response_submitted_payload() {
        let n = Notification::ResponseSubmitted {
            event_id: Uuid::nil(),
            activity_id: Uuid::nil(),
            response_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "response.submitted");
        assert!(json["response_id"].is_string());
        let back: Notification = serde_json::from_value(json).unwrap();
        assert_eq!(back, n);
    }
}
