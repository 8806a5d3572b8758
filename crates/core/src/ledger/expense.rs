//! Expense lines recorded against a shift.
//!
//! Each entry carries one mandatory fixed line (the daily wages) and any
//! number of ad-hoc lines identified by millisecond stamps. On the wire the
//! fixed line keeps the literal id `"fixed-daily"` and ad-hoc lines use the
//! bare number, so records written by older clients load unchanged.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shiftbook_shared::types::{lenient_amount, next_stamp};

use super::error::LedgerError;

/// Wire id of the fixed daily line.
pub const FIXED_DAILY_ID: &str = "fixed-daily";

/// Item label of the fixed daily line.
pub const FIXED_DAILY_ITEM: &str = "اليوميات";

/// Identity of an expense line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseLineId {
    /// The mandatory recurring daily line. Never removable.
    Fixed,
    /// A line added during the shift, stamped at creation.
    AdHoc(i64),
}

impl ExpenseLineId {
    /// Creates a fresh ad-hoc id.
    #[must_use]
    pub fn new_ad_hoc() -> Self {
        Self::AdHoc(next_stamp())
    }

    /// Reads an id from its persisted JSON form.
    fn from_value(value: &Value) -> Result<Self, LedgerError> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::AdHoc)
                .ok_or_else(|| LedgerError::InvalidLineId(n.to_string())),
            Value::String(s) => Self::from_key(s),
            other => Err(LedgerError::InvalidLineId(other.to_string())),
        }
    }

    /// Reads an id from a string, including display keys with a
    /// `-<shift>-<idx>` suffix saved without their original id.
    fn from_key(key: &str) -> Result<Self, LedgerError> {
        let key = key.trim();
        if key.starts_with(FIXED_DAILY_ID) {
            return Ok(Self::Fixed);
        }
        let stamp = key.split('-').next().unwrap_or_default();
        stamp
            .parse()
            .map(Self::AdHoc)
            .map_err(|_| LedgerError::InvalidLineId(key.to_string()))
    }

    fn to_value(self) -> Value {
        match self {
            Self::Fixed => Value::String(FIXED_DAILY_ID.to_string()),
            Self::AdHoc(stamp) => Value::from(stamp),
        }
    }
}

impl fmt::Display for ExpenseLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => f.write_str(FIXED_DAILY_ID),
            Self::AdHoc(stamp) => write!(f, "{stamp}"),
        }
    }
}

/// One expense paid out of the till during a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireExpenseLine", into = "WireExpenseLine")]
pub struct ExpenseLine {
    /// Line identity.
    pub id: ExpenseLineId,
    /// What the money was spent on.
    pub item: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Label of the shift that recorded the line.
    pub shift_name: Option<String>,
    /// Username of the worker that recorded the line.
    pub user_name: Option<String>,
    /// Display key assigned when several entries are merged into one view.
    pub view_key: Option<String>,
}

impl ExpenseLine {
    /// The empty fixed daily line every new entry starts with.
    #[must_use]
    pub fn fixed_daily() -> Self {
        Self {
            id: ExpenseLineId::Fixed,
            item: FIXED_DAILY_ITEM.to_string(),
            amount: Decimal::ZERO,
            shift_name: None,
            user_name: None,
            view_key: None,
        }
    }

    /// A new ad-hoc line with a fresh id.
    #[must_use]
    pub fn ad_hoc(
        item: impl Into<String>,
        amount: Decimal,
        shift_name: Option<String>,
        user_name: Option<String>,
    ) -> Self {
        Self {
            id: ExpenseLineId::new_ad_hoc(),
            item: item.into(),
            amount,
            shift_name,
            user_name,
            view_key: None,
        }
    }

    /// Key the line is addressed by inside its entry.
    #[must_use]
    pub fn key(&self) -> String {
        self.view_key
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Returns true for the mandatory daily line.
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(self.id, ExpenseLineId::Fixed)
    }

    /// Returns true if an amount has been entered.
    #[must_use]
    pub fn has_amount(&self) -> bool {
        !self.amount.is_zero()
    }
}

/// Persisted shape of an expense line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireExpenseLine {
    id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_id: Option<Value>,
    #[serde(default)]
    item: String,
    #[serde(with = "lenient_amount", default)]
    amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shift_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_name: Option<String>,
}

impl TryFrom<WireExpenseLine> for ExpenseLine {
    type Error = LedgerError;

    fn try_from(wire: WireExpenseLine) -> Result<Self, Self::Error> {
        let (id, view_key) = match &wire.original_id {
            Some(original) => {
                let view_key = match &wire.id {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (ExpenseLineId::from_value(original)?, Some(view_key))
            }
            None => (ExpenseLineId::from_value(&wire.id)?, None),
        };
        Ok(Self {
            id,
            item: wire.item,
            amount: wire.amount,
            shift_name: wire.shift_name,
            user_name: wire.user_name,
            view_key,
        })
    }
}

impl From<ExpenseLine> for WireExpenseLine {
    fn from(line: ExpenseLine) -> Self {
        let (id, original_id) = match line.view_key {
            Some(key) => (Value::String(key), Some(line.id.to_value())),
            None => (line.id.to_value(), None),
        };
        Self {
            id,
            original_id,
            item: line.item,
            amount: line.amount,
            shift_name: line.shift_name,
            user_name: line.user_name,
        }
    }
}
