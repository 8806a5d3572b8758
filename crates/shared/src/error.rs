//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Module-level errors in `shiftbook-core` and `shiftbook-db` convert into
/// this type at the binary boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied for the current role.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation (e.g. closing a month too early).
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., duplicate name).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Local store error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote sync error.
    #[error("Sync error: {0}")]
    Sync(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true if this error is a user-facing rejection.
    ///
    /// Rejections abort the operation without mutating state and are shown to
    /// the user as a warning. Everything else is logged and degraded.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::NotFound(_)
                | Self::Validation(_)
                | Self::BusinessRule(_)
                | Self::Conflict(_)
        )
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Sync(_) => "SYNC_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
