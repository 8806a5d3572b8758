//! The shared table as the sync engine's remote store.

use async_trait::async_trait;
use serde_json::Value;
use shiftbook_core::storage::StoreKey;
use shiftbook_core::sync::{RemoteChange, RemoteStore, SyncError};

use crate::entities::system_data;
use crate::repositories::SystemDataRepository;

/// Postgres-backed [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct PgRemoteStore {
    repo: SystemDataRepository,
}

impl PgRemoteStore {
    /// Creates a remote store over the repository.
    #[must_use]
    pub const fn new(repo: SystemDataRepository) -> Self {
        Self { repo }
    }
}

impl From<system_data::Model> for RemoteChange {
    fn from(row: system_data::Model) -> Self {
        Self {
            key: row.key,
            value: row.value,
        }
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn upsert(&self, key: StoreKey, value: &Value) -> Result<(), SyncError> {
        self.repo
            .upsert(key.wire_name(), Some(value.clone()))
            .await
            .map_err(|e| SyncError::remote(e.to_string()))
    }

    async fn fetch_all(&self) -> Result<Vec<RemoteChange>, SyncError> {
        let rows = self.repo.all().await.map_err(|e| SyncError::remote(e.to_string()))?;
        Ok(rows.into_iter().map(RemoteChange::from).collect())
    }
}
