//! Local key-value store using Apache OpenDAL.
//!
//! Every persisted key is one JSON document. The same key names are used for
//! the remote table, so a document can be pushed or pulled without mapping.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  AppState                    │
//! ├──────────────────────────────────────────────┤
//! │        KeyValueStore (get / set / clear)     │
//! ├──────────────────────────────────────────────┤
//! │   OpenDAL: services-fs   │  services-memory  │
//! └──────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod keys;
mod service;

pub use config::StoreProvider;
pub use error::StorageError;
pub use keys::StoreKey;
pub use service::{KeyValueStore, StorageService};
