//! The remote key-value table, as seen from the sync layer.

use async_trait::async_trait;
use serde_json::Value;

use super::convergence::RemoteChange;
use super::error::SyncError;
use crate::storage::StoreKey;

/// Shared table every device writes to.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts or replaces the value for a key.
    async fn upsert(&self, key: StoreKey, value: &Value) -> Result<(), SyncError>;

    /// Every row currently in the table.
    async fn fetch_all(&self) -> Result<Vec<RemoteChange>, SyncError>;
}
