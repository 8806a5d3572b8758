//! Authentication, user management and local sessions.
//!
//! This module provides:
//! - Password digests compatible with the stored user list
//! - User role definitions and the seed users
//! - Login and user CRUD over the shared user list
//! - The local session and its idle watchdog

mod error;
mod password;
pub mod session;
pub mod users;

pub use error::AuthError;
pub use password::{hash_password, is_digest, verify_password};
pub use session::{DEFAULT_TAB, IdleWatchdog, SessionState};
pub use users::{NewUser, UserService, UserUpdate};

use serde::{Deserialize, Serialize};

use crate::ledger::ShiftKind;

/// User roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Manager: finalizes days and months, manages users, deletes ledger rows.
    Super,
    /// Cashier: logs their own shift.
    User,
}

impl UserRole {
    /// Returns true if this role can finalize days and months.
    #[must_use]
    pub const fn can_finalize(&self) -> bool {
        matches!(self, Self::Super)
    }

    /// Returns true if this role can manage users.
    #[must_use]
    pub const fn can_manage_users(&self) -> bool {
        matches!(self, Self::Super)
    }

    /// Returns true if this role can delete orders and debtors.
    #[must_use]
    pub const fn can_delete_records(&self) -> bool {
        matches!(self, Self::Super)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Super => write!(f, "super"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A login account as stored in the shared user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUser {
    /// Login name, matched case-insensitively.
    pub username: String,
    /// Password digest (see [`hash_password`]).
    pub password: String,
    /// Shift the user works; super users use the admin shift.
    pub shift: ShiftKind,
    /// Permission level.
    pub role: UserRole,
}

impl SystemUser {
    /// Returns true if the username matches, ignoring case.
    #[must_use]
    pub fn is_named(&self, username: &str) -> bool {
        self.username.to_lowercase() == username.trim().to_lowercase()
    }

    /// Returns true for super users.
    #[must_use]
    pub const fn is_super(&self) -> bool {
        matches!(self.role, UserRole::Super)
    }
}

/// Users installed when the stored user list is empty.
#[must_use]
pub fn seed_users() -> Vec<SystemUser> {
    const ADMIN_DIGEST: &str = "2551dabd83d93de39f2368b346651aa66e73a7cef7a4feb8583131dab42fee6f";
    const CASHIER_DIGEST: &str = "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4";

    let user = |username: &str, password: &str, shift, role| SystemUser {
        username: username.to_string(),
        password: password.to_string(),
        shift,
        role,
    };
    vec![
        user("admin", ADMIN_DIGEST, ShiftKind::Admin, UserRole::Super),
        user("medhat", CASHIER_DIGEST, ShiftKind::Morning, UserRole::User),
        user("abdo", CASHIER_DIGEST, ShiftKind::Evening, UserRole::User),
        user("adham", CASHIER_DIGEST, ShiftKind::Night, UserRole::User),
    ]
}
