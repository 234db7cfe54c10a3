// Domain error taxonomy
//
// Services raise one of these; the HTTP boundary matches on `ErrorKind`
// exhaustively to pick a status code.

use thiserror::Error;

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Discriminator for `DomainError`, used by transports to map errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthorized,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::InvalidInput => "BAD_REQUEST",
            ErrorKind::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Errors raised by domain and service code
#[derive(Debug, Error)]
pub enum DomainError {
    /// Entity does not exist or is soft-deleted
    #[error("{0} not found")]
    NotFound(String),

    /// Authenticated, but not allowed to touch this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No valid session or participant identity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input is well-formed but semantically invalid
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unexpected failure (storage, serialization, ...)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        DomainError::Unauthorized(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(anyhow::anyhow!(msg.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::Unauthorized(_) => ErrorKind::Unauthorized,
            DomainError::InvalidInput(_) => ErrorKind::InvalidInput,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.into())
    }
}
