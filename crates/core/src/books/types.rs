//! Order and debtor records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shiftbook_shared::types::{DebtorId, OrderId, lenient_amount};

/// A purchase from a supplier, possibly paid in part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Creation stamp.
    pub id: OrderId,
    /// What was ordered.
    pub item: String,
    /// Supplier name, if recorded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub supplier: String,
    /// Order value.
    #[serde(with = "lenient_amount", default)]
    pub price: Decimal,
    /// Amount already paid, never above the price.
    #[serde(with = "lenient_amount", default)]
    pub paid_amount: Decimal,
    /// Delivery date.
    pub date: NaiveDate,
    /// When the order was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Order {
    /// Amount still owed to the supplier.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.price - self.paid_amount
    }
}

/// Input for creating or updating an order.
#[derive(Debug, Clone)]
pub struct OrderInput {
    /// What was ordered.
    pub item: String,
    /// Supplier name, may be empty.
    pub supplier: String,
    /// Order value.
    pub price: Decimal,
    /// Amount paid so far.
    pub paid_amount: Decimal,
    /// Delivery date.
    pub date: NaiveDate,
}

/// Summary over all orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotals {
    /// Sum of prices.
    pub value: Decimal,
    /// Sum of payments.
    pub paid: Decimal,
    /// Value minus payments.
    pub remaining: Decimal,
}

/// A customer account in the debt notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debtor {
    /// Creation stamp.
    pub id: DebtorId,
    /// Customer name, unique ignoring case.
    pub name: String,
    /// Amount the customer owes.
    #[serde(with = "lenient_amount", default)]
    pub balance: Decimal,
    /// Legacy movement log, carried through untouched.
    #[serde(default)]
    pub history: Vec<serde_json::Value>,
}

/// Input for creating or updating a debtor.
#[derive(Debug, Clone)]
pub struct DebtorInput {
    /// Customer name.
    pub name: String,
    /// Amount owed.
    pub balance: Decimal,
}
