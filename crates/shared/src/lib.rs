//! Shared types, errors, and configuration for Shiftbook.
//!
//! This crate provides common types used across all other crates:
//! - Decimal amounts with lenient parsing of persisted values
//! - Typed IDs for type-safe record references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
