// Input validation for presenter APIs
//
// Size and shape limits checked before any service call. Semantic checks on
// activity payloads and answers live with the domain types.

// =============================================================================
// Input Size Limits
// =============================================================================

/// Maximum size for an event title.
pub const MAX_EVENT_TITLE_BYTES: usize = 200;

/// Maximum size for an event description.
pub const MAX_EVENT_DESCRIPTION_BYTES: usize = 2000;

/// Maximum number of ids in a reorder request.
pub const MAX_REORDER_IDS: usize = 1000;

/// Generic validation error message returned to clients.
/// Intentionally vague to avoid leaking which field exceeded limits.
pub const VALIDATION_ERROR_MESSAGE: &str = "Input exceeds allowed limits";

// =============================================================================
// Validation Functions
// =============================================================================

/// Validation error - returns generic message to avoid leaking details
#[derive(Debug)]
pub struct ValidationError;

/// Title must be non-blank and within limits
pub fn validate_event_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        tracing::warn!("Event title is empty");
        return Err(ValidationError);
    }
    if title.len() > MAX_EVENT_TITLE_BYTES {
        tracing::warn!(
            "Event title exceeds limit: {} bytes (max: {})",
            title.len(),
            MAX_EVENT_TITLE_BYTES
        );
        return Err(ValidationError);
    }
    Ok(())
}

/// Validate event description size
pub fn validate_event_description(description: Option<&str>) -> Result<(), ValidationError> {
    if let Some(desc) = description {
        if desc.len() > MAX_EVENT_DESCRIPTION_BYTES {
            tracing::warn!(
                "Event description exceeds limit: {} bytes (max: {})",
                desc.len(),
                MAX_EVENT_DESCRIPTION_BYTES
            );
            return Err(ValidationError);
        }
    }
    Ok(())
}

/// Validate reorder request size
pub fn validate_reorder_count(count: usize) -> Result<(), ValidationError> {
    if count > MAX_REORDER_IDS {
        tracing::warn!(
            "Reorder request exceeds limit: {} ids (max: {})",
            count,
            MAX_REORDER_IDS
        );
        return Err(ValidationError);
    }
    Ok(())
}
