//! Login and user management over the shared user list.

use tracing::info;

use super::error::AuthError;
use super::password::{hash_password, verify_password};
use super::{SystemUser, UserRole};
use crate::ledger::ShiftKind;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Shift the user works.
    pub shift: ShiftKind,
    /// Permission level.
    pub role: UserRole,
}

/// Input for updating a user. Blank password keeps the current digest.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    /// New login name.
    pub username: String,
    /// New plaintext password, or empty to keep the current one.
    pub password: String,
    /// Shift the user works.
    pub shift: ShiftKind,
    /// Permission level.
    pub role: UserRole,
}

/// Stateless login and user CRUD.
pub struct UserService;

impl UserService {
    /// Finds the user matching the credentials.
    ///
    /// Usernames compare case-insensitively.
    pub fn authenticate(
        users: &[SystemUser],
        username: &str,
        password: &str,
    ) -> Result<SystemUser, AuthError> {
        users
            .iter()
            .find(|u| u.is_named(username) && verify_password(password, &u.password))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Adds a user with a hashed password.
    pub fn add_user(
        users: &mut Vec<SystemUser>,
        actor: &SystemUser,
        input: NewUser,
    ) -> Result<(), AuthError> {
        Self::require_manager(actor)?;
        let username = input.username.trim();
        if username.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if users.iter().any(|u| u.is_named(username)) {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        users.push(SystemUser {
            username: username.to_string(),
            password: hash_password(&input.password),
            shift: input.shift,
            role: input.role,
        });
        info!(username = %username, role = %input.role, "user added");
        Ok(())
    }

    /// Updates a user, renaming and rehashing as needed.
    pub fn update_user(
        users: &mut [SystemUser],
        actor: &SystemUser,
        current_username: &str,
        update: UserUpdate,
    ) -> Result<(), AuthError> {
        Self::require_manager(actor)?;
        let username = update.username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let index = users
            .iter()
            .position(|u| u.is_named(current_username))
            .ok_or_else(|| AuthError::UserNotFound(current_username.to_string()))?;
        let taken = users
            .iter()
            .enumerate()
            .any(|(i, u)| i != index && u.is_named(username));
        if taken {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let user = &mut users[index];
        user.username = username.to_string();
        user.shift = update.shift;
        user.role = update.role;
        if !update.password.is_empty() {
            user.password = hash_password(&update.password);
        }
        info!(username = %username, "user updated");
        Ok(())
    }

    /// Deletes a user other than the actor.
    pub fn delete_user(
        users: &mut Vec<SystemUser>,
        actor: &SystemUser,
        username: &str,
    ) -> Result<SystemUser, AuthError> {
        Self::require_manager(actor)?;
        if actor.is_named(username) {
            return Err(AuthError::SelfDeletion);
        }
        let index = users
            .iter()
            .position(|u| u.is_named(username))
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
        let removed = users.remove(index);
        info!(username = %removed.username, "user deleted");
        Ok(removed)
    }

    fn require_manager(actor: &SystemUser) -> Result<(), AuthError> {
        if actor.role.can_manage_users() {
            Ok(())
        } else {
            Err(AuthError::Forbidden("manage users"))
        }
    }
}
