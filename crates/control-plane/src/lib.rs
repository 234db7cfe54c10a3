// Crowdpulse Control Plane Library
// Decision: Shared library for binaries (API server, OpenAPI export) and integration tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Server configuration
pub mod config;

// Live connections (SSE fan-out)
pub mod realtime;

// Services layer
pub mod services;
pub use services::{ActivityResponseService, ActivityService, EventService};

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{AuthConfig, AuthState};
use crate::config::ServerConfig;
use crate::openapi::ApiDoc;
use crate::realtime::ConnectionRegistry;
use crate::storage::StorageBackend;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    auth_mode: &'static str,
    storage: &'static str,
    live_connections: usize,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    auth_mode: &'static str,
    storage: &'static str,
    registry: Arc<ConnectionRegistry>,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        auth_mode: state.auth_mode,
        storage: state.storage,
        live_connections: state.registry.total_connections(),
    })
}

/// Build the full HTTP application: API routes, health, Swagger UI and layers.
///
/// The connection registry is created here and shared by every service, so
/// each router owns an independent set of live connections.
pub fn build_router(
    config: &ServerConfig,
    auth_config: AuthConfig,
    db: Arc<StorageBackend>,
) -> Router {
    let registry = Arc::new(ConnectionRegistry::new());
    let auth_state = AuthState::new(auth_config.clone());

    let event_service = Arc::new(EventService::new(
        db.clone(),
        registry.clone(),
        config.short_code_max_attempts,
    ));
    let activity_service = Arc::new(ActivityService::new(db.clone(), registry.clone()));
    let response_service = Arc::new(ActivityResponseService::new(db.clone(), registry.clone()));

    // Create module-specific states
    let events_state = api::events::AppState::new(event_service.clone(), auth_state.clone());
    let activities_state =
        api::activities::AppState::new(activity_service.clone(), auth_state.clone());
    let responses_state = api::responses::AppState::new(response_service, auth_state.clone());
    let join_state = api::join::AppState::new(
        event_service.clone(),
        activity_service,
        auth_state.clone(),
    );
    let live_state = api::live::AppState::new(
        event_service,
        registry.clone(),
        config.live_channel_capacity,
        config.live_keepalive,
    );
    let users_state = api::users::UsersState { auth: auth_state };
    let health_state = HealthState {
        auth_mode: auth_config.mode.as_str(),
        storage: db.kind(),
        registry,
    };

    let api_routes = Router::new()
        .merge(api::events::routes(events_state))
        .merge(api::activities::routes(activities_state))
        .merge(api::responses::routes(responses_state))
        .merge(api::join::routes(join_state))
        .merge(api::live::routes(live_state))
        .merge(api::users::routes(users_state));

    // Build main router with health (not prefixed) and prefixed API routes
    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(build_router_with_prefix(api_routes, &config.api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !config.cors_origins.is_empty() {
        app.layer(cors_layer(config.cors_origins.clone()))
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            header::HeaderName::from_static(auth::PARTICIPANT_TOKEN_HEADER),
        ])
        .allow_credentials(true)
}

/// Build router with optional API prefix (extracted for testing)
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
