// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Default to "none" mode for local development
// Decision: Tokens are issued by an external identity provider; we only verify them

use std::time::Duration;
use uuid::Uuid;

/// Authentication mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// No authentication required (local development)
    #[default]
    None,
    /// Bearer JWTs signed with a shared HS256 secret
    Jwt,
}

impl AuthMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "jwt" => AuthMode::Jwt,
            _ => AuthMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Jwt => "jwt",
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key shared with the identity provider
    pub secret: String,
    /// Expected `aud` claim; audience is not checked when unset
    pub audience: Option<String>,
    /// Lifetime of tokens minted by `JwtService::generate_access_token`
    pub access_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            audience: None,
            access_token_lifetime: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Authentication mode
    pub mode: AuthMode,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Identity every request acts as in `none` mode
    pub dev_user_id: Uuid,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::None,
            jwt: JwtConfig::default(),
            dev_user_id: Uuid::nil(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mode = std::env::var("AUTH_MODE")
            .map(|s| AuthMode::from_str(&s))
            .unwrap_or_default();

        let secret = std::env::var("AUTH_JWT_SECRET").unwrap_or_else(|_| {
            if mode == AuthMode::None {
                // Never used to verify anything in none mode
                use rand::Rng;
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            } else {
                tracing::warn!("AUTH_JWT_SECRET not set, using insecure default");
                "insecure-dev-secret-change-me".to_string()
            }
        });

        let audience = std::env::var("AUTH_JWT_AUDIENCE")
            .ok()
            .filter(|s| !s.is_empty());

        let access_token_lifetime = std::env::var("AUTH_JWT_ACCESS_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60 * 60));

        let dev_user_id = std::env::var("AUTH_DEV_USER_ID")
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok())
            .unwrap_or_else(Uuid::nil);

        Self {
            mode,
            jwt: JwtConfig {
                secret,
                audience,
                access_token_lifetime,
            },
            dev_user_id,
        }
    }

    /// Check if authentication is enabled
    pub fn is_enabled(&self) -> bool {
        self.mode != AuthMode::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_mode_parsing() {
        assert_eq!(AuthMode::from_str("none"), AuthMode::None);
        assert_eq!(AuthMode::from_str("NONE"), AuthMode::None);
        assert_eq!(AuthMode::from_str("jwt"), AuthMode::Jwt);
        assert_eq!(AuthMode::from_str("JWT"), AuthMode::Jwt);
        assert_eq!(AuthMode::from_str("invalid"), AuthMode::None);
    }

    #[test]
    fn test_default_config() {
        let config = AuthConfig::default();
        assert_eq!(config.mode, AuthMode::None);
        assert!(!config.is_enabled());
        assert!(config.jwt.audience.is_none());
        assert_eq!(config.dev_user_id, Uuid::nil());
    }

    #[test]
    fn test_jwt_mode_is_enabled() {
        let config = AuthConfig {
            mode: AuthMode::Jwt,
            ..Default::default()
        };
        assert!(config.is_enabled());
        assert_eq!(config.mode.as_str(), "jwt");
    }
}
