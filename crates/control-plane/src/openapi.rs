// OpenAPI specification generation
//
// This module defines the OpenAPI spec for the Crowdpulse API.
// It is served by the API server (Swagger UI) and written out by the
// export-openapi binary (static spec generation).

use crate::api;
use crate::api::common::DeletedResponse;
use crate::api::{ErrorResponse, ListResponse};
use crowdpulse_core::{
    Activity, ActivityKind, ActivityResponse, ActivityResults, Event, Notification, PublicEvent,
    Respondent, ResponseAnswer, ShortCode,
};
use utoipa::OpenApi;

/// OpenAPI documentation for the Crowdpulse API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::events::create_event,
        api::events::list_events,
        api::events::get_event,
        api::events::update_event,
        api::events::delete_event,
        api::events::regenerate_short_code,
        api::events::set_active_activity,
        api::activities::create_activity,
        api::activities::list_activities,
        api::activities::reorder_activities,
        api::activities::update_activity,
        api::activities::delete_activity,
        api::responses::submit_response,
        api::responses::get_my_response,
        api::responses::list_responses,
        api::responses::clear_responses,
        api::responses::get_results,
        api::join::join_event,
        api::join::list_join_activities,
        api::live::stream_sse,
        api::live::live_status,
        api::live::connection_count,
        api::users::get_me,
    ),
    components(
        schemas(
            Event, PublicEvent, ShortCode,
            Activity, ActivityKind,
            ActivityResponse, ActivityResults, Respondent, ResponseAnswer,
            Notification,
            ErrorResponse, DeletedResponse,
            api::events::CreateEventRequest, api::events::UpdateEventRequest,
            api::events::SetActiveActivityRequest,
            api::activities::CreateActivityRequest, api::activities::UpdateActivityRequest,
            api::activities::ReorderActivitiesRequest,
            api::responses::SubmitResponseRequest,
            api::join::JoinResponse,
            api::live::LiveStatusResponse, api::live::ConnectionCountResponse,
            api::users::CurrentUser,
            ListResponse<Event>,
            ListResponse<Activity>,
            ListResponse<ActivityResponse>,
        )
    ),
    tags(
        (name = "events", description = "Presenter event management endpoints"),
        (name = "activities", description = "Activity authoring and ordering endpoints"),
        (name = "responses", description = "Audience responses and aggregated results"),
        (name = "audience", description = "Join an event by short code"),
        (name = "live", description = "Live update streaming endpoints (SSE)"),
        (name = "users", description = "Current user endpoints")
    ),
    info(
        title = "Crowdpulse API",
        version = "0.1.0",
        description = "API for running live audience events: activities, responses and live updates",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_every_route() {
        let json: serde_json::Value = serde_json::from_str(&ApiDoc::to_json().unwrap()).unwrap();
        let paths = json["paths"].as_object().unwrap();

        for path in [
            "/v1/events",
            "/v1/events/{event_id}",
            "/v1/events/{event_id}/short-code",
            "/v1/events/{event_id}/active-activity",
            "/v1/events/{event_id}/activities",
            "/v1/events/{event_id}/activities/order",
            "/v1/activities/{activity_id}",
            "/v1/activities/{activity_id}/responses",
            "/v1/activities/{activity_id}/responses/me",
            "/v1/activities/{activity_id}/results",
            "/v1/join/{short_code}",
            "/v1/join/{short_code}/activities",
            "/v1/live/{short_code}/sse",
            "/v1/live/{short_code}/status",
            "/v1/live/{short_code}/connections",
            "/v1/me",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
