// Storage layer for the Crowdpulse control-plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - Database: sqlx/PostgreSQL repository
// - InMemoryDatabase: HashMap-backed store with the same API
// - StorageBackend: enum dispatch over the two

pub mod backend;
pub mod memory;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;

/// Raised when a new or regenerated short code collides with an active event.
/// Callers retry with a fresh code.
#[derive(Debug, thiserror::Error)]
#[error("short code {0} is already in use")]
pub struct ShortCodeTaken(pub String);
