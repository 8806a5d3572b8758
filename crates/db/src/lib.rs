//! Remote key-value table for Shiftbook.
//!
//! This crate provides:
//! - The `SeaORM` entity for `t1t_system_data`
//! - A repository with upsert and the admin maintenance operations
//! - [`PgRemoteStore`], the sync engine's remote store
//! - [`ChangeListener`], the LISTEN/NOTIFY change feed
//! - Database migrations

pub mod entities;
pub mod listener;
pub mod migration;
pub mod remote;
pub mod repositories;

pub use listener::{CHANGE_CHANNEL, ChangeListener};
pub use remote::PgRemoteStore;
pub use repositories::SystemDataRepository;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use shiftbook_shared::config::DatabaseConfig;
use tracing::info;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    info!(max = config.max_connections, "database pool ready");
    Ok(db)
}
