//! Local/remote synchronization.
//!
//! Local writes land in the key-value store immediately and reach the remote
//! table after a per-key quiet period. Remote changes arrive on a channel and
//! are merged one at a time; a change equal to local state is a no-op, so
//! devices converge without ping-pong.

pub mod convergence;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod remote;

pub use convergence::{MergeOutcome, RemoteChange, merge_remote};
pub use debounce::WriteDebouncer;
pub use engine::SyncEngine;
pub use error::SyncError;
pub use remote::RemoteStore;
