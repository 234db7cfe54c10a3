// Activity HTTP routes (presenter)

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{patch, post, put},
    Json, Router,
};
use crowdpulse_core::{Activity, ActivityKind};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::ListResponse;
use super::error::{ApiJson, ApiResult};
use super::validation::validate_reorder_count;
use crate::auth::{AuthState, AuthUser};
use crate::services::ActivityService;

/// Request to add an activity to the end of an event
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateActivityRequest {
    /// Type-specific payload, tagged by `type`.
    pub kind: ActivityKind,
}

/// Request to replace an activity's payload. The `type` must not change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateActivityRequest {
    pub kind: ActivityKind,
}

/// New order of an event's activities
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderActivitiesRequest {
    /// Every activity id of the event, in the desired order.
    pub activity_ids: Vec<Uuid>,
}

/// App state for activity routes
#[derive(Clone, FromRef)]
pub struct AppState {
    pub service: Arc<ActivityService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(service: Arc<ActivityService>, auth: AuthState) -> Self {
        Self { service, auth }
    }
}

/// Create activity routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/events/:event_id/activities",
            post(create_activity).get(list_activities),
        )
        .route(
            "/v1/events/:event_id/activities/order",
            put(reorder_activities),
        )
        .route(
            "/v1/activities/:activity_id",
            patch(update_activity).delete(delete_activity),
        )
        .with_state(state)
}

/// POST /v1/events/{event_id}/activities - Append an activity
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/activities",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = Activity),
        (status = 400, description = "Invalid activity payload", body = super::ErrorResponse),
        (status = 403, description = "Event belongs to another user", body = super::ErrorResponse),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn create_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateActivityRequest>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    let activity = state.service.create(user.id, event_id, req.kind).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /v1/events/{event_id}/activities - List activities in order
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/activities",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Activities ordered by position", body = ListResponse<Activity>),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<ListResponse<Activity>>> {
    let activities = state.service.list(user.id, event_id).await?;
    Ok(Json(ListResponse::new(activities)))
}

/// PUT /v1/events/{event_id}/activities/order - Reorder activities
#[utoipa::path(
    put,
    path = "/v1/events/{event_id}/activities/order",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    request_body = ReorderActivitiesRequest,
    responses(
        (status = 200, description = "Activities in their new order", body = ListResponse<Activity>),
        (status = 400, description = "Ids are not a permutation of the event's activities", body = super::ErrorResponse),
        (status = 404, description = "Event not found", body = super::ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn reorder_activities(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    ApiJson(req): ApiJson<ReorderActivitiesRequest>,
) -> ApiResult<Json<ListResponse<Activity>>> {
    validate_reorder_count(req.activity_ids.len())?;
    let activities = state
        .service
        .reorder(user.id, event_id, req.activity_ids)
        .await?;
    Ok(Json(ListResponse::new(activities)))
}

/// PATCH /v1/activities/{activity_id} - Replace an activity's payload
#[utoipa::path(
    patch,
    path = "/v1/activities/{activity_id}",
    params(("activity_id" = Uuid, Path, description = "Activity ID")),
    request_body = UpdateActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = Activity),
        (status = 400, description = "Invalid payload or type change", body = super::ErrorResponse),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn update_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateActivityRequest>,
) -> ApiResult<Json<Activity>> {
    Ok(Json(
        state.service.update(user.id, activity_id, req.kind).await?,
    ))
}

/// DELETE /v1/activities/{activity_id} - Delete an activity
#[utoipa::path(
    delete,
    path = "/v1/activities/{activity_id}",
    params(("activity_id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "activities"
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.service.delete(user.id, activity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
