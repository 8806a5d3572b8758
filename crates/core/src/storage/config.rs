//! Store provider configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shiftbook_shared::config::StoreSettings;

/// Backend holding the local key-value documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreProvider {
    /// One JSON file per key under a directory.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process map, lost on exit (tests, demo mode).
    Memory,
}

impl StoreProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create in-memory provider.
    #[must_use]
    pub const fn memory() -> Self {
        Self::Memory
    }

    /// Get the provider name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "fs",
            Self::Memory => "memory",
        }
    }
}

impl From<&StoreSettings> for StoreProvider {
    fn from(settings: &StoreSettings) -> Self {
        if settings.in_memory {
            Self::Memory
        } else {
            Self::local_fs(settings.root.clone())
        }
    }
}
