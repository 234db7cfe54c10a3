// Event HTTP routes (presenter)

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use crowdpulse_core::Event;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{double_option, ListResponse};
use super::error::{ApiJson, ApiResult};
use super::validation::{validate_event_description, validate_event_title};
use crate::auth::{AuthState, AuthUser};
use crate::services::EventService;

/// Request to create a new event
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display title shown to the audience.
    #[schema(example = "Quarterly all-hands")]
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    #[schema(example = "Questions welcome throughout")]
    pub description: Option<String>,
}

/// Request to update an event. Only provided fields will be updated;
/// `"description": null` clears the description.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

/// Choose the activity the audience sees
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetActiveActivityRequest {
    /// Activity to show, or `null` to show none.
    pub activity_id: Option<Uuid>,
}

/// App state for event routes
#[derive(Clone, FromRef)]
pub struct AppState {
    pub service: Arc<EventService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(service: Arc<EventService>, auth: AuthState) -> Self {
        Self { service, auth }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(create_event).get(list_events))
        .route(
            "/v1/events/:event_id",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/v1/events/:event_id/short-code", post(regenerate_short_code))
        .route("/v1/events/:event_id/active-activity", put(set_active_activity))
        .with_state(state)
}

/// POST /v1/events - Create a new event
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid input", body = super::ErrorResponse),
        (status = 401, description = "Authentication required", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    validate_event_title(&req.title)?;
    validate_event_description(req.description.as_deref())?;

    let event = state.service.create(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events - List the caller's events
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "Caller's events, newest first", body = ListResponse<Event>),
        (status = 401, description = "Authentication required", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ListResponse<Event>>> {
    let events = state.service.list(user.id).await?;
    Ok(Json(ListResponse::new(events)))
}

/// GET /v1/events/{event_id} - Get event by ID
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 403, description = "Event belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    Ok(Json(state.service.get(user.id, event_id).await?))
}

/// PATCH /v1/events/{event_id} - Update event
#[utoipa::path(
    patch,
    path = "/v1/events/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Invalid input", body = super::ErrorResponse),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    if let Some(title) = &req.title {
        validate_event_title(title)?;
    }
    if let Some(description) = &req.description {
        validate_event_description(description.as_deref())?;
    }

    Ok(Json(state.service.update(user.id, event_id, req).await?))
}

/// DELETE /v1/events/{event_id} - Soft delete event
#[utoipa::path(
    delete,
    path = "/v1/events/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.service.delete(user.id, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/events/{event_id}/short-code - Issue a new short code
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/short-code",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event with its new short code", body = Event),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn regenerate_short_code(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Event>> {
    Ok(Json(
        state.service.regenerate_short_code(user.id, event_id).await?,
    ))
}

/// PUT /v1/events/{event_id}/active-activity - Set the presented activity
#[utoipa::path(
    put,
    path = "/v1/events/{event_id}/active-activity",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = SetActiveActivityRequest,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 400, description = "Activity is not part of this event", body = super::ErrorResponse),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "events"
)]
pub async fn set_active_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    ApiJson(req): ApiJson<SetActiveActivityRequest>,
) -> ApiResult<Json<Event>> {
    Ok(Json(
        state
            .service
            .set_active_activity(user.id, event_id, req.activity_id)
            .await?,
    ))
}
