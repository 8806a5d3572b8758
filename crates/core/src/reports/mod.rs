//! Daily and monthly report reconciliation.
//!
//! This module provides pure logic for:
//! - Finalizing a business date from its shift entries
//! - Closing a fiscal month from its daily reports
//! - Background reconciliation of closed months after a daily report changes

pub mod error;
pub mod service;
pub mod types;


pub use error::ReconcileError;
pub use service::ReportService;
pub use types::*;
