//! Key-value store implementation using Apache OpenDAL.

use async_trait::async_trait;
use opendal::{ErrorKind, Operator, services};
use serde_json::Value;
use tracing::debug;

use super::config::StoreProvider;
use super::error::StorageError;
use super::keys::StoreKey;

/// Durable string-keyed JSON documents.
///
/// A missing document reads as `None`. Callers decide what a missing or
/// unusable document falls back to.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a document.
    async fn get(&self, key: StoreKey) -> Result<Option<Value>, StorageError>;

    /// Writes a document, replacing any previous value.
    async fn set(&self, key: StoreKey, value: &Value) -> Result<(), StorageError>;

    /// Deletes every document.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Local store keeping one `<key>.json` document per key.
#[derive(Clone)]
pub struct StorageService {
    operator: Operator,
    provider: StoreProvider,
}

impl StorageService {
    /// Create a new store from a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: StoreProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&provider)?;
        Ok(Self { operator, provider })
    }

    /// In-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be built.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::from_provider(StoreProvider::memory())
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StoreProvider) -> Result<Operator, StorageError> {
        match provider {
            StoreProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StoreProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// The underlying operator, shared with export sinks.
    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator.clone()
    }

    /// Check if a document exists.
    pub async fn exists(&self, key: StoreKey) -> bool {
        match self.operator.stat(&key.path()).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }
}

#[async_trait]
impl KeyValueStore for StorageService {
    async fn get(&self, key: StoreKey) -> Result<Option<Value>, StorageError> {
        let bytes = match self.operator.read(&key.path()).await {
            Ok(buffer) => buffer.to_vec(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = serde_json::from_slice(&bytes)?;
        Ok(Some(value))
    }

    async fn set(&self, key: StoreKey, value: &Value) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)?;
        debug!(%key, bytes = bytes.len(), "writing document");
        self.operator
            .write(&key.path(), bytes)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        for key in StoreKey::ALL {
            self.operator
                .delete(&key.path())
                .await
                .map_err(StorageError::from)?;
        }
        debug!(provider = self.provider_name(), "store cleared");
        Ok(())
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
