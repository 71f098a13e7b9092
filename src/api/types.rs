//! Shared types for the API layer.

use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::core_state::CoreState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Open a per-request database connection.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        self.core.open_db().map_err(ApiError::from)
    }
}

/// Parse a path id. Ids that are not UUIDs cannot exist, so they are 404s.
pub fn parse_record_id(raw: &str, entity: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw.trim()).map_err(|_| ApiError::NotFound(format!("{entity} not found")))
}

/// Trimmed value of a required text field, or a 422 with `message`.
pub fn require_text<'a>(value: &'a str, message: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Unprocessable(message.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("  Cluster A ", "msg").unwrap(), "Cluster A");
    }

    #[test]
    fn require_text_rejects_blank() {
        let err = require_text("   ", "Please add your cluster name").unwrap_err();
        assert!(matches!(err, ApiError::Unprocessable(m) if m == "Please add your cluster name"));
    }

    #[test]
    fn non_uuid_id_is_not_found() {
        assert!(matches!(parse_record_id("abc", "Query"), Err(ApiError::NotFound(_))));
        assert!(parse_record_id(&uuid::Uuid::new_v4().to_string(), "Query").is_ok());
    }
}
