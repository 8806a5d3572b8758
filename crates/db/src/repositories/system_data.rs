//! Repository for the shared key-value table.

use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use serde_json::Value;
use shiftbook_core::auth::{SystemUser, hash_password};
use shiftbook_core::storage::StoreKey;
use tracing::{debug, info, warn};

use crate::entities::system_data;

/// System data repository: one JSON document per key.
#[derive(Debug, Clone)]
pub struct SystemDataRepository {
    db: DatabaseConnection,
}

impl SystemDataRepository {
    /// Creates a new system data repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts or replaces the document for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub async fn upsert(&self, key: &str, value: Option<Value>) -> Result<(), DbErr> {
        let row = system_data::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(chrono::Utc::now().into()),
        };

        system_data::Entity::insert(row)
            .on_conflict(
                OnConflict::column(system_data::Column::Key)
                    .update_columns([system_data::Column::Value, system_data::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        debug!(key, "system data upserted");
        Ok(())
    }

    /// Finds the row for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, key: &str) -> Result<Option<system_data::Model>, DbErr> {
        system_data::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
    }

    /// Lists every row, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn all(&self) -> Result<Vec<system_data::Model>, DbErr> {
        system_data::Entity::find()
            .order_by_asc(system_data::Column::Key)
            .all(&self.db)
            .await
    }

    /// Resets every data key to its empty value. Users and the kill switch
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed write; keys before it stay reset.
    pub async fn reset_data(&self) -> Result<usize, DbErr> {
        for key in StoreKey::RESETTABLE {
            self.upsert(key.wire_name(), Some(key.reset_value())).await?;
            info!(%key, "key reset");
        }
        Ok(StoreKey::RESETTABLE.len())
    }

    /// Sets the admin password and bumps the kill switch so every device
    /// drops its session.
    ///
    /// Returns whether an `admin` super user was found in the stored list.
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails or the stored user list cannot be
    /// decoded.
    pub async fn secure_reset(&self, admin_password: &str, signal: i64) -> Result<bool, DbErr> {
        let mut admin_found = false;
        let key = StoreKey::SystemUsers.wire_name();

        if let Some(value) = self.get(key).await?.and_then(|row| row.value) {
            let mut users: Vec<SystemUser> =
                serde_json::from_value(value).map_err(|e| DbErr::Json(e.to_string()))?;
            for user in users.iter_mut().filter(|u| u.is_super() && u.is_named("admin")) {
                user.password = hash_password(admin_password);
                admin_found = true;
            }
            let users = serde_json::to_value(&users).map_err(|e| DbErr::Json(e.to_string()))?;
            self.upsert(key, Some(users)).await?;
        }
        if !admin_found {
            warn!("no admin user in stored list, password unchanged");
        }

        self.upsert(
            StoreKey::KillSwitch.wire_name(),
            Some(Value::String(signal.to_string())),
        )
        .await?;
        info!(signal, "kill switch triggered");
        Ok(admin_found)
    }
}
