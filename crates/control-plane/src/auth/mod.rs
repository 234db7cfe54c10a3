// Authentication
//
// Presenters authenticate with a JWT (or run as the dev user when auth is
// off); audience members may instead present an anonymous participant token.

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::{AuthConfig, AuthMode, JwtConfig};
pub use jwt::{AccessTokenClaims, JwtService};
pub use middleware::{
    AuthError, AuthMethod, AuthState, AuthUser, Participant, ACCESS_TOKEN_COOKIE,
    PARTICIPANT_TOKEN_HEADER,
};
