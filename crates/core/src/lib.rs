//! Core business logic for Shiftbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, aggregation rules, and reconciliation live here.
//!
//! # Modules
//!
//! - `fiscal` - Fiscal months running from the 6th to the 5th
//! - `ledger` - Shift entries and their expense lines
//! - `reports` - Daily and monthly aggregates and cascade reconciliation
//! - `auth` - Users, password digests and the local session
//! - `books` - Supplier orders and customer debts
//! - `state` - The application state and its guarded operations
//! - `storage` - Local key-value persistence over OpenDAL
//! - `sync` - Convergence merge and debounced remote writes
//! - `export` - Report documents for spreadsheet export

pub mod auth;
pub mod books;
pub mod export;
pub mod fiscal;
pub mod ledger;
pub mod reports;
pub mod state;
pub mod storage;
pub mod sync;
