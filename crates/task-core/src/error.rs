//! Unified error type shared by every layer of the platform.

use serde::{Deserialize, Serialize};

/// The platform's single error type.
///
/// Every layer — registry, scheduler, repositories, service facade —
/// returns this type so callers can classify failures without knowing
/// which layer produced them.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("temporarily unavailable: {0}")]
    Transient(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TaskError {
    pub fn not_found(resource: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::Permission(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// The HTTP-class status an external wrapper should map this to.
    /// This crate has no HTTP dependency; the numbers are the contract.
    #[must_use]
    pub const fn status_class(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) | Self::Integrity(_) => 409,
            Self::Permission(_) => 403,
            Self::Transient(_) => 503,
            Self::Internal(_) | Self::Other(_) => 500,
        }
    }

    /// Machine-readable, SCREAMING_SNAKE_CASE error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Permission(_) => "PERMISSION_DENIED",
            Self::Transient(_) => "TRANSIENT_ERROR",
            Self::Integrity(_) => "INTEGRITY_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may retry the operation as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for TaskError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource: "row".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                let is_unique_violation = db_err
                    .code()
                    .map(|c| c == "23505" || c == "1062")
                    .unwrap_or(false);
                if is_unique_violation {
                    Self::Conflict(db_err.message().to_string())
                } else {
                    Self::Transient(format!("database error: {db_err}"))
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                Self::Transient(format!("database unavailable: {err}"))
            }
            other => Self::Internal(format!("database error: {other}")),
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for TaskError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_dropped() || err.is_timeout() || err.is_connection_refusal() {
            Self::Transient(format!("redis unavailable: {err}"))
        } else {
            Self::Internal(format!("redis error: {err}"))
        }
    }
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(format!("invalid json: {err}"))
    }
}

/// User-visible error envelope, per the external error contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&TaskError> for ErrorResponse {
    fn from(err: &TaskError) -> Self {
        Self {
            code: err.error_code(),
            message: err.to_string(),
            details: None,
        }
    }
}

impl ErrorResponse {
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classes_match_taxonomy() {
        assert_eq!(TaskError::validation("x").status_class(), 400);
        assert_eq!(TaskError::not_found("task_config", 1).status_class(), 404);
        assert_eq!(TaskError::conflict("x").status_class(), 409);
        assert_eq!(TaskError::permission("x").status_class(), 403);
        assert_eq!(TaskError::transient("x").status_class(), 503);
        assert_eq!(TaskError::integrity("x").status_class(), 409);
        assert_eq!(TaskError::internal("x").status_class(), 500);
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(TaskError::transient("x").is_retryable());
        assert!(!TaskError::conflict("x").is_retryable());
        assert!(!TaskError::internal("x").is_retryable());
    }

    #[test]
    fn error_response_carries_code_and_message() {
        let err = TaskError::not_found("schedule", "abc123");
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "NOT_FOUND");
        assert!(resp.message.contains("abc123"));
    }
}
