// Live update HTTP routes (SSE)
//
// Clients hold one SSE connection per event. Notifications carry ids only;
// clients re-fetch what changed through the regular routes.

use axum::{
    extract::{Path, State},
    response::sse::{KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use crowdpulse_core::{DomainError, Event};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use super::common::parse_short_code;
use super::error::ApiResult;
use crate::realtime::{ChannelStream, ConnectionRegistry, LiveChannel};
use crate::services::EventService;

/// Live status of an event
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusResponse {
    /// The short code the status is for.
    #[schema(example = "AB12CD")]
    pub short_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Open live connections for the event.
    pub connection_count: usize,
}

/// Number of open live connections
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCountResponse {
    pub connection_count: usize,
}

/// App state for live routes
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventService>,
    pub registry: Arc<ConnectionRegistry>,
    pub channel_capacity: usize,
    pub keepalive: Duration,
}

impl AppState {
    pub fn new(
        events: Arc<EventService>,
        registry: Arc<ConnectionRegistry>,
        channel_capacity: usize,
        keepalive: Duration,
    ) -> Self {
        Self {
            events,
            registry,
            channel_capacity,
            keepalive,
        }
    }
}

/// Create live routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/live/:short_code/sse", get(stream_sse))
        .route("/v1/live/:short_code/status", get(live_status))
        .route("/v1/live/:short_code/connections", get(connection_count))
        .with_state(state)
}

/// GET /v1/live/{short_code}/sse - Subscribe to an event's live updates
#[utoipa::path(
    get,
    path = "/v1/live/{short_code}/sse",
    params(("short_code" = String, Path, description = "Event short code (case-insensitive)")),
    responses(
        (status = 200, description = "Notification stream; first event is `connected`", content_type = "text/event-stream"),
        (status = 404, description = "No active event with this code", body = super::ErrorResponse)
    ),
    tag = "live"
)]
pub async fn stream_sse(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> ApiResult<Sse<ChannelStream>> {
    let short_code = parse_short_code(&short_code)?;
    let event = state.events.get_by_short_code(&short_code).await?;

    // Registered before the response is returned, so counts include it at once
    let stream = state
        .registry
        .open_sse(event.short_code.clone(), state.channel_capacity);
    let stream = confirm_subscription(&state.events, stream, &event).await?;
    tracing::info!(
        short_code = %event.short_code,
        event_id = %event.id,
        channel_id = %stream.channel().id(),
        "Live channel opening"
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keepalive)))
}

/// Check the event still owns its code now that the channel is registered.
/// A delete or code change that ran `close_all` before registration would
/// otherwise leave the channel listening on a released code.
async fn confirm_subscription(
    events: &EventService,
    stream: ChannelStream,
    event: &Event,
) -> ApiResult<ChannelStream> {
    match events.get_by_short_code(&event.short_code).await {
        Ok(current) if current.id == event.id => Ok(stream),
        Ok(_) => {
            drop(stream);
            Err(DomainError::not_found("Event").into())
        }
        Err(e) => {
            // Dropping the stream closes the channel and unregisters it
            drop(stream);
            Err(e.into())
        }
    }
}

/// GET /v1/live/{short_code}/status - Live status of an event
#[utoipa::path(
    get,
    path = "/v1/live/{short_code}/status",
    params(("short_code" = String, Path, description = "Event short code (case-insensitive)")),
    responses(
        (status = 200, description = "Live status", body = LiveStatusResponse),
        (status = 404, description = "No active event with this code", body = super::ErrorResponse)
    ),
    tag = "live"
)]
pub async fn live_status(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> ApiResult<Json<LiveStatusResponse>> {
    let short_code = parse_short_code(&short_code)?;
    let event = state.events.get_by_short_code(&short_code).await?;

    Ok(Json(LiveStatusResponse {
        short_id: event.short_code.to_string(),
        timestamp: Utc::now(),
        message: "Live updates available".to_string(),
        connection_count: state.registry.count(&event.short_code),
    }))
}

/// GET /v1/live/{short_code}/connections - Open connection count
#[utoipa::path(
    get,
    path = "/v1/live/{short_code}/connections",
    params(("short_code" = String, Path, description = "Event short code (case-insensitive)")),
    responses(
        (status = 200, description = "Connection count", body = ConnectionCountResponse),
        (status = 404, description = "No active event with this code", body = super::ErrorResponse)
    ),
    tag = "live"
)]
pub async fn connection_count(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> ApiResult<Json<ConnectionCountResponse>> {
    let short_code = parse_short_code(&short_code)?;
    let event = state.events.get_by_short_code(&short_code).await?;

    Ok(Json(ConnectionCountResponse {
        connection_count: state.registry.count(&event.short_code),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::CreateEventRequest;
    use crate::storage::StorageBackend;
    use uuid::Uuid;

    fn services() -> (EventService, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let db = Arc::new(StorageBackend::in_memory());
        (EventService::new(db, registry.clone(), 16), registry)
    }

    fn create_req() -> CreateEventRequest {
        CreateEventRequest {
            title: "Keynote".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_subscription_kept_while_event_is_live() {
        let (events, registry) = services();
        let event = events.create(Uuid::nil(), create_req()).await.unwrap();

        let stream = registry.open_sse(event.short_code.clone(), 8);
        let stream = confirm_subscription(&events, stream, &event).await.unwrap();
        assert_eq!(registry.count(&event.short_code), 1);
        drop(stream);
        assert_eq!(registry.count(&event.short_code), 0);
    }

    #[tokio::test]
    async fn test_subscription_dropped_when_event_deleted_before_registration() {
        let (events, registry) = services();
        let event = events.create(Uuid::nil(), create_req()).await.unwrap();

        // Delete lands between resolving the code and registering the channel
        events.delete(Uuid::nil(), event.id).await.unwrap();
        let stream = registry.open_sse(event.short_code.clone(), 8);
        assert_eq!(registry.count(&event.short_code), 1);

        match confirm_subscription(&events, stream, &event).await {
            Err(err) => assert_eq!(err.0.kind(), crowdpulse_core::ErrorKind::NotFound),
            Ok(_) => panic!("subscription to a deleted event was kept"),
        }
        assert_eq!(registry.count(&event.short_code), 0);
    }

    #[tokio::test]
    async fn test_subscription_dropped_when_code_moved_to_another_event() {
        let (events, registry) = services();
        let event = events.create(Uuid::nil(), create_req()).await.unwrap();
        let stale = Event {
            id: Uuid::now_v7(),
            ..event.clone()
        };

        let stream = registry.open_sse(event.short_code.clone(), 8);
        assert!(confirm_subscription(&events, stream, &stale).await.is_err());
        assert_eq!(registry.count(&event.short_code), 0);
    }
}
