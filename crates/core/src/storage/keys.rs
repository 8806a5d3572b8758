//! Persisted key names.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::error::StorageError;
use crate::auth::DEFAULT_TAB;

/// Keys of the documents held in the local store and mirrored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    /// Shift entries.
    Records,
    /// Daily reports.
    DailyReports,
    /// Monthly reports.
    MonthlyReports,
    /// Supplier orders.
    Orders,
    /// Customer debts.
    Debtors,
    /// The working entry of the logged-in user.
    CurrentEntry,
    /// Selected screen.
    ActiveTab,
    /// Login flag.
    IsLoggedIn,
    /// Logged-in user.
    CurrentUser,
    /// Login accounts.
    SystemUsers,
    /// Expense item suggestions.
    ExpenseCategories,
    /// Bumped to force every device to log out.
    KillSwitch,
}

impl StoreKey {
    /// Every key, in load order.
    pub const ALL: [Self; 12] = [
        Self::Records,
        Self::DailyReports,
        Self::MonthlyReports,
        Self::Orders,
        Self::Debtors,
        Self::CurrentEntry,
        Self::ActiveTab,
        Self::IsLoggedIn,
        Self::CurrentUser,
        Self::SystemUsers,
        Self::ExpenseCategories,
        Self::KillSwitch,
    ];

    /// Keys cleared by a data reset. Users and the kill switch survive.
    pub const RESETTABLE: [Self; 7] = [
        Self::Records,
        Self::DailyReports,
        Self::MonthlyReports,
        Self::Orders,
        Self::Debtors,
        Self::CurrentEntry,
        Self::ActiveTab,
    ];

    /// Name used in the local store and the remote table.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Records => "t1t_records",
            Self::DailyReports => "t1t_daily_reports",
            Self::MonthlyReports => "t1t_monthly_reports",
            Self::Orders => "t1t_orders",
            Self::Debtors => "t1t_debtors",
            Self::CurrentEntry => "t1t_currentEntry",
            Self::ActiveTab => "t1t_activeTab",
            Self::IsLoggedIn => "t1t_isLoggedIn",
            Self::CurrentUser => "t1t_currentUser",
            Self::SystemUsers => "t1t_system_users",
            Self::ExpenseCategories => "t1t_expense_categories",
            Self::KillSwitch => "t1t_kill_switch",
        }
    }

    /// Looks a key up by wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.wire_name() == name)
    }

    /// Keys that describe one device's session and never leave it.
    #[must_use]
    pub const fn is_session_scoped(self) -> bool {
        matches!(self, Self::IsLoggedIn | Self::CurrentUser | Self::ActiveTab)
    }

    /// Keys holding a list that reads as empty when missing.
    #[must_use]
    pub const fn is_record_collection(self) -> bool {
        matches!(
            self,
            Self::Records | Self::DailyReports | Self::MonthlyReports | Self::Orders | Self::Debtors
        )
    }

    /// Value a data reset writes for the key.
    #[must_use]
    pub fn reset_value(self) -> Value {
        match self {
            Self::ActiveTab => Value::String(DEFAULT_TAB.to_string()),
            Self::CurrentEntry => Value::Null,
            _ => Value::Array(Vec::new()),
        }
    }

    /// Path of the key's document inside the store.
    #[must_use]
    pub fn path(self) -> String {
        format!("{}.json", self.wire_name())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for StoreKey {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| StorageError::NotFound { key: s.to_string() })
    }
}
