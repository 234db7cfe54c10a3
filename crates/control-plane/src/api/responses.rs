// Activity response HTTP routes
//
// Audience members submit and read back their own answer; the presenter
// lists and clears all of them. Results are visible to both.

use axum::{
    extract::{FromRef, Path, State},
    routing::get,
    Json, Router,
};
use crowdpulse_core::{ActivityResponse, ActivityResults, ResponseAnswer};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{DeletedResponse, ListResponse};
use super::error::{ApiJson, ApiResult};
use crate::auth::{AuthState, AuthUser, Participant};
use crate::services::ActivityResponseService;

/// Answer to an interactive activity
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitResponseRequest {
    /// Answer payload, tagged by `type`; must match the activity kind.
    pub answer: ResponseAnswer,
}

/// App state for response routes
#[derive(Clone, FromRef)]
pub struct AppState {
    pub service: Arc<ActivityResponseService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(service: Arc<ActivityResponseService>, auth: AuthState) -> Self {
        Self { service, auth }
    }
}

/// Create response routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/activities/:activity_id/responses",
            get(list_responses)
                .post(submit_response)
                .delete(clear_responses),
        )
        .route(
            "/v1/activities/:activity_id/responses/me",
            get(get_my_response),
        )
        .route("/v1/activities/:activity_id/results", get(get_results))
        .with_state(state)
}

/// POST /v1/activities/{activity_id}/responses - Submit or replace an answer
#[utoipa::path(
    post,
    path = "/v1/activities/{activity_id}/responses",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID"),
        ("X-Participant-Token" = Option<String>, Header, description = "Anonymous participant token")
    ),
    request_body = SubmitResponseRequest,
    responses(
        (status = 200, description = "Stored response", body = ActivityResponse),
        (status = 400, description = "Answer does not fit the activity", body = super::ErrorResponse),
        (status = 401, description = "No user or participant identity", body = super::ErrorResponse),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "responses"
)]
pub async fn submit_response(
    State(state): State<AppState>,
    Participant(respondent): Participant,
    Path(activity_id): Path<Uuid>,
    ApiJson(req): ApiJson<SubmitResponseRequest>,
) -> ApiResult<Json<ActivityResponse>> {
    let response = state
        .service
        .submit(&respondent, activity_id, req.answer)
        .await?;
    Ok(Json(response))
}

/// GET /v1/activities/{activity_id}/responses/me - The caller's own answer
#[utoipa::path(
    get,
    path = "/v1/activities/{activity_id}/responses/me",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID"),
        ("X-Participant-Token" = Option<String>, Header, description = "Anonymous participant token")
    ),
    responses(
        (status = 200, description = "Caller's response", body = ActivityResponse),
        (status = 404, description = "No response yet", body = super::ErrorResponse)
    ),
    tag = "responses"
)]
pub async fn get_my_response(
    State(state): State<AppState>,
    Participant(respondent): Participant,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Json<ActivityResponse>> {
    Ok(Json(state.service.get_mine(&respondent, activity_id).await?))
}

/// GET /v1/activities/{activity_id}/responses - All responses (owner only)
#[utoipa::path(
    get,
    path = "/v1/activities/{activity_id}/responses",
    params(("activity_id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Responses in submission order", body = ListResponse<ActivityResponse>),
        (status = 403, description = "Activity belongs to another user's event", body = super::ErrorResponse),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "responses"
)]
pub async fn list_responses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Json<ListResponse<ActivityResponse>>> {
    let responses = state.service.list(user.id, activity_id).await?;
    Ok(Json(ListResponse::new(responses)))
}

/// DELETE /v1/activities/{activity_id}/responses - Clear all responses
#[utoipa::path(
    delete,
    path = "/v1/activities/{activity_id}/responses",
    params(("activity_id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Number of responses removed", body = DeletedResponse),
        (status = 403, description = "Activity belongs to another user's event", body = super::ErrorResponse),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "responses"
)]
pub async fn clear_responses(
    State(state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.service.clear(user.id, activity_id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// GET /v1/activities/{activity_id}/results - Aggregated results
#[utoipa::path(
    get,
    path = "/v1/activities/{activity_id}/results",
    params(
        ("activity_id" = Uuid, Path, description = "Activity ID"),
        ("X-Participant-Token" = Option<String>, Header, description = "Anonymous participant token")
    ),
    responses(
        (status = 200, description = "Aggregated results", body = ActivityResults),
        (status = 404, description = "Activity not found", body = super::ErrorResponse)
    ),
    tag = "responses"
)]
pub async fn get_results(
    State(state): State<AppState>,
    _participant: Participant,
    Path(activity_id): Path<Uuid>,
) -> ApiResult<Json<ActivityResults>> {
    Ok(Json(state.service.results(activity_id).await?))
}
