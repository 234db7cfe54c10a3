// Authentication middleware and extractors
// Decision: Support both cookie-based (browser) and header-based (API) auth
// Decision: In "none" mode, every request acts as the configured dev user
// Decision: Audience members without an account identify with X-Participant-Token

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use crowdpulse_core::{ErrorKind, Respondent};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    config::{AuthConfig, AuthMode},
    jwt::JwtService,
};

/// Header carrying an anonymous participant's token
pub const PARTICIPANT_TOKEN_HEADER: &str = "x-participant-token";

/// Cookie the browser client stores its access token in
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: ErrorKind::Unauthorized.code(),
            status: StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Authenticated user context extracted from request
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User ID (token subject)
    pub id: Uuid,
    /// User email, when known
    pub email: Option<String>,
    /// Authentication method used
    pub auth_method: AuthMethod,
}

impl AuthUser {
    /// The fixed identity used in no-auth mode
    pub fn dev(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            auth_method: AuthMethod::None,
        }
    }
}

/// Authentication method used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication (dev user)
    None,
    /// JWT access token
    Jwt,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Jwt => "jwt",
        }
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
        }
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state)
    }
}

/// Extract authenticated user from request
fn extract_auth_user(parts: &Parts, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    if auth_state.config.mode == AuthMode::None {
        return Ok(AuthUser::dev(auth_state.config.dev_user_id));
    }

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AuthError::unauthorized("Invalid authorization header"))?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return validate_jwt_token(token, auth_state);
        }
        return Err(AuthError::unauthorized("Unsupported authorization scheme"));
    }

    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return validate_jwt_token(cookie.value(), auth_state);
    }

    Err(AuthError::unauthorized("Authentication required"))
}

/// Validate JWT token and return user
fn validate_jwt_token(token: &str, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    let claims = auth_state
        .jwt_service
        .validate_access_token(token)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {:#}", e);
            AuthError::unauthorized("Invalid or expired token")
        })?;

    let id = claims
        .user_id()
        .map_err(|_| AuthError::unauthorized("Invalid user ID in token"))?;

    Ok(AuthUser {
        id,
        email: claims.email,
        auth_method: AuthMethod::Jwt,
    })
}

/// Audience identity: a participant token if one is sent without credentials,
/// otherwise the authenticated user.
#[derive(Debug, Clone)]
pub struct Participant(pub Respondent);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Participant
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let has_credentials = parts.headers.contains_key(header::AUTHORIZATION)
            || CookieJar::from_headers(&parts.headers)
                .get(ACCESS_TOKEN_COOKIE)
                .is_some();

        if !has_credentials {
            if let Some(value) = parts.headers.get(PARTICIPANT_TOKEN_HEADER) {
                let token = value
                    .to_str()
                    .map_err(|_| AuthError::unauthorized("Invalid participant token"))?;
                let respondent = Respondent::anonymous(token.trim())
                    .map_err(|_| AuthError::unauthorized("Invalid participant token"))?;
                return Ok(Participant(respondent));
            }
        }

        let user = extract_auth_user(parts, &auth_state)?;
        Ok(Participant(Respondent::User(user.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::JwtConfig;
    use axum::http::Request;

    fn jwt_state() -> AuthState {
        AuthState::new(AuthConfig {
            mode: AuthMode::Jwt,
            jwt: JwtConfig {
                secret: "middleware-test-secret".to_string(),
                ..Default::default()
            },
            dev_user_id: Uuid::nil(),
        })
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_none_mode_returns_dev_user() {
        let dev_id = Uuid::now_v7();
        let state = AuthState::new(AuthConfig {
            dev_user_id: dev_id,
            ..Default::default()
        });
        let mut p = parts(&[]);
        let user = AuthUser::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(user.id, dev_id);
        assert_eq!(user.auth_method, AuthMethod::None);
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let state = jwt_state();
        let mut p = parts(&[]);
        let err = AuthUser::from_request_parts(&mut p, &state).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_tokens() {
        let state = jwt_state();
        let user_id = Uuid::now_v7();
        let token = state.jwt_service.generate_access_token(user_id, None).unwrap();

        let bearer = format!("Bearer {}", token);
        let mut p = parts(&[("authorization", bearer.as_str())]);
        let user = AuthUser::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(user.id, user_id);

        let cookie = format!("{}={}", ACCESS_TOKEN_COOKIE, token);
        let mut p = parts(&[("cookie", cookie.as_str())]);
        let user = AuthUser::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(user.auth_method, AuthMethod::Jwt);
    }

    #[tokio::test]
    async fn test_participant_token() {
        let state = jwt_state();
        let mut p = parts(&[(PARTICIPANT_TOKEN_HEADER, "participant-0123456789")]);
        let Participant(respondent) = Participant::from_request_parts(&mut p, &state)
            .await
            .unwrap();
        assert_eq!(
            respondent,
            Respondent::Anonymous("participant-0123456789".to_string())
        );

        let mut p = parts(&[(PARTICIPANT_TOKEN_HEADER, "short")]);
        assert!(Participant::from_request_parts(&mut p, &state).await.is_err());

        let mut p = parts(&[]);
        assert!(Participant::from_request_parts(&mut p, &state).await.is_err());
    }

    #[tokio::test]
    async fn test_participant_prefers_credentials() {
        let state = jwt_state();
        let user_id = Uuid::now_v7();
        let token = state.jwt_service.generate_access_token(user_id, None).unwrap();
        let bearer = format!("Bearer {}", token);
        let mut p = parts(&[
            ("authorization", bearer.as_str()),
            (PARTICIPANT_TOKEN_HEADER, "participant-0123456789"),
        ]);
        let Participant(respondent) = Participant::from_request_parts(&mut p, &state)
            .await
            .unwrap();
        assert_eq!(respondent, Respondent::User(user_id));
    }
}
