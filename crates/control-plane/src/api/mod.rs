// HTTP API routes
//
// Each submodule handles one resource with its own AppState.

pub mod activities;
pub mod common;
pub mod error;
pub mod events;
pub mod join;
pub mod live;
pub mod responses;
pub mod users;
pub mod validation;

// Re-export common types
pub use common::{ErrorResponse, ListResponse};
pub use error::{ApiError, ApiJson, ApiResult};
