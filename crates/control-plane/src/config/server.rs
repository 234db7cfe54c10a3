// Server configuration loaded from environment variables.
// Decision: Run without DATABASE_URL using in-memory storage (dev mode)
// Decision: Live channel limits are tunable per deployment

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
/// Default queue length of each live channel
pub const DEFAULT_LIVE_CHANNEL_CAPACITY: usize = 64;
/// Default SSE keep-alive interval in seconds
pub const DEFAULT_LIVE_KEEPALIVE_SECS: u64 = 15;
/// Default number of short codes tried before giving up
pub const DEFAULT_SHORT_CODE_MAX_ATTEMPTS: u32 = 16;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Prefix for all API routes, e.g. "/api" (empty for none)
    pub api_prefix: String,
    /// Origins allowed for cross-origin requests (empty disables CORS)
    pub cors_origins: Vec<HeaderValue>,
    /// Postgres connection string; in-memory storage when unset
    pub database_url: Option<String>,
    /// Queue length of each live channel before it counts as stalled
    pub live_channel_capacity: usize,
    /// Interval between SSE keep-alive comments
    pub live_keepalive: Duration,
    /// Attempts at finding a free short code for a new event
    pub short_code_max_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            api_prefix: String::new(),
            cors_origins: Vec::new(),
            database_url: None,
            live_channel_capacity: DEFAULT_LIVE_CHANNEL_CAPACITY,
            live_keepalive: Duration::from_secs(DEFAULT_LIVE_KEEPALIVE_SECS),
            short_code_max_attempts: DEFAULT_SHORT_CODE_MAX_ATTEMPTS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:9000")?;

        // Example: API_PREFIX="/api" results in routes like /api/v1/events
        let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();

        // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
        let cors_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let live_channel_capacity = env_parse("LIVE_CHANNEL_CAPACITY")?
            .unwrap_or(DEFAULT_LIVE_CHANNEL_CAPACITY)
            .max(1);
        let live_keepalive = Duration::from_secs(
            env_parse("LIVE_KEEPALIVE_SECS")?
                .unwrap_or(DEFAULT_LIVE_KEEPALIVE_SECS)
                .max(1),
        );
        let short_code_max_attempts = env_parse("SHORT_CODE_MAX_ATTEMPTS")?
            .unwrap_or(DEFAULT_SHORT_CODE_MAX_ATTEMPTS)
            .max(1);

        Ok(Self {
            bind_addr,
            api_prefix,
            cors_origins,
            database_url,
            live_channel_capacity,
            live_keepalive,
            short_code_max_attempts,
        })
    }
}

/// Split a comma-separated origin list, skipping blanks and invalid values
pub fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {value}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.api_prefix.is_empty());
        assert!(config.database_url.is_none());
        assert_eq!(config.live_channel_capacity, 64);
        assert_eq!(config.live_keepalive, Duration::from_secs(15));
        assert_eq!(config.short_code_max_attempts, 16);
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins("https://a.example.com, ,https://b.example.com,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://a.example.com");
        assert_eq!(origins[1], "https://b.example.com");
    }

    #[test]
    fn test_parse_origins_empty() {
        assert!(parse_origins("").is_empty());
    }
}
