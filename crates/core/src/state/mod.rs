//! Application state: every shared collection plus the working entry.
//!
//! The state object is loaded once from the local store, edited through its
//! methods, and written back key by key by the sync engine.

mod app;
mod error;


pub use app::{AppState, DEFAULT_CATEGORIES};
pub use error::StateError;
