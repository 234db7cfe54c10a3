// Audience join routes
//
// Resolve a short code to the public view of its event and the activity
// currently on screen.

use axum::{
    extract::{FromRef, Path, State},
    routing::get,
    Json, Router,
};
use crowdpulse_core::{Activity, PublicEvent};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::common::{parse_short_code, ListResponse};
use super::error::ApiResult;
use crate::auth::{AuthState, Participant};
use crate::services::{ActivityService, EventService};

/// What an audience member sees after entering a short code
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinResponse {
    pub event: PublicEvent,
    /// Activity the presenter is showing, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_activity: Option<Activity>,
}

/// App state for join routes
#[derive(Clone, FromRef)]
pub struct AppState {
    pub events: Arc<EventService>,
    pub activities: Arc<ActivityService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(events: Arc<EventService>, activities: Arc<ActivityService>, auth: AuthState) -> Self {
        Self {
            events,
            activities,
            auth,
        }
    }
}

/// Create join routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/join/:short_code", get(join_event))
        .route("/v1/join/:short_code/activities", get(list_join_activities))
        .with_state(state)
}

/// GET /v1/join/{short_code} - Join an event by short code
#[utoipa::path(
    get,
    path = "/v1/join/{short_code}",
    params(
        ("short_code" = String, Path, description = "Event short code (case-insensitive)"),
        ("X-Participant-Token" = Option<String>, Header, description = "Anonymous participant token")
    ),
    responses(
        (status = 200, description = "Event found", body = JoinResponse),
        (status = 404, description = "No active event with this code", body = super::ErrorResponse)
    ),
    tag = "audience"
)]
pub async fn join_event(
    State(state): State<AppState>,
    _participant: Participant,
    Path(short_code): Path<String>,
) -> ApiResult<Json<JoinResponse>> {
    let short_code = parse_short_code(&short_code)?;
    let event = state.events.get_by_short_code(&short_code).await?;

    let active_activity = match event.active_activity_id {
        Some(id) => Some(state.activities.get(id).await?),
        None => None,
    };

    Ok(Json(JoinResponse {
        event: event.to_public(),
        active_activity,
    }))
}

/// GET /v1/join/{short_code}/activities - Activities of a joined event
#[utoipa::path(
    get,
    path = "/v1/join/{short_code}/activities",
    params(
        ("short_code" = String, Path, description = "Event short code (case-insensitive)"),
        ("X-Participant-Token" = Option<String>, Header, description = "Anonymous participant token")
    ),
    responses(
        (status = 200, description = "Activities ordered by position", body = ListResponse<Activity>),
        (status = 404, description = "No active event with this code", body = super::ErrorResponse)
    ),
    tag = "audience"
)]
pub async fn list_join_activities(
    State(state): State<AppState>,
    _participant: Participant,
    Path(short_code): Path<String>,
) -> ApiResult<Json<ListResponse<Activity>>> {
    let short_code = parse_short_code(&short_code)?;
    let activities = state.activities.list_by_short_code(&short_code).await?;
    Ok(Json(ListResponse::new(activities)))
}
