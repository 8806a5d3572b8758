//! Authentication and user management errors.

use thiserror::Error;

/// Errors that can occur during login and user management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Unknown username or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No user is logged in.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The current role may not perform the action.
    #[error("Only a super user may {0}")]
    Forbidden(&'static str),

    /// Username and password are both required.
    #[error("Username and password are required")]
    MissingCredentials,

    /// Another user already has this username.
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// No user with this username.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Users cannot delete their own account.
    #[error("Cannot delete the logged-in user")]
    SelfDeletion,
}

impl From<AuthError> for shiftbook_shared::AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::NotLoggedIn => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::Forbidden(_) => Self::Forbidden(err.to_string()),
            AuthError::MissingCredentials => Self::Validation(err.to_string()),
            AuthError::DuplicateUsername(_) => Self::Conflict(err.to_string()),
            AuthError::UserNotFound(_) => Self::NotFound(err.to_string()),
            AuthError::SelfDeletion => Self::BusinessRule(err.to_string()),
        }
    }
}
