//! Fiscal month calendar.
//!
//! The shop closes its books on the 5th: a fiscal month runs from the 6th of
//! a calendar month through the 5th of the next one. Every report filter goes
//! through this module.

pub mod error;
pub mod period;

#[cfg(test)]
mod period_props;

pub use error::FiscalError;
pub use period::{
    FISCAL_MONTH_START_DAY, FiscalMonth, fiscal_month_of, is_in_fiscal_month, local_now, parse_date,
};
