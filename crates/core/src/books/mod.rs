//! Side ledgers: supplier orders and the customer debt notebook.
//!
//! Neither feeds the daily or monthly reports. Orders appear in the monthly
//! export only.

pub mod error;
pub mod service;
pub mod types;

pub use error::BookError;
pub use service::BookService;
pub use types::{Debtor, DebtorInput, Order, OrderInput, OrderTotals};
