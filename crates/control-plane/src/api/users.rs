// Current user route
// Lets a frontend confirm its credentials and learn its user id.

use axum::{extract::FromRef, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthState, AuthUser};

/// App state for user routes
#[derive(Clone, FromRef)]
pub struct UsersState {
    pub auth: AuthState,
}

/// The authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// How the caller was authenticated (`none` or `jwt`).
    pub auth_method: String,
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            auth_method: user.auth_method.as_str().to_string(),
        }
    }
}

/// Create user routes
pub fn routes(state: UsersState) -> Router {
    Router::new().route("/v1/me", get(get_me)).with_state(state)
}

/// GET /v1/me - The authenticated caller
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUser),
        (status = 401, description = "Authentication required", body = super::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_me(user: AuthUser) -> Json<CurrentUser> {
    Json(CurrentUser::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthMethod;

    #[test]
    fn test_current_user_from_dev_user() {
        let current = CurrentUser::from(AuthUser::dev(Uuid::nil()));
        assert_eq!(current.id, Uuid::nil());
        assert_eq!(current.auth_method, "none");

        let json = serde_json::to_value(&current).unwrap();
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_current_user_keeps_email() {
        let user = AuthUser {
            id: Uuid::now_v7(),
            email: Some("host@example.com".to_string()),
            auth_method: AuthMethod::Jwt,
        };
        let current = CurrentUser::from(user);
        assert_eq!(current.email.as_deref(), Some("host@example.com"));
        assert_eq!(current.auth_method, "jwt");
    }
}
