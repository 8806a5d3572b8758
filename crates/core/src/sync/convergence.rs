//! Merging remote changes into local state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SessionState;
use crate::state::AppState;
use crate::storage::StoreKey;

/// A row change observed on the remote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChange {
    /// Wire name of the key.
    pub key: String,
    /// New value; `None` when the row was cleared.
    pub value: Option<Value>,
}

impl RemoteChange {
    /// Builds a change for a known key.
    #[must_use]
    pub fn new(key: StoreKey, value: Option<Value>) -> Self {
        Self {
            key: key.wire_name().to_string(),
            value,
        }
    }
}

/// What merging a remote change did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Local state took the remote value.
    Applied(StoreKey),
    /// Remote value equals local state.
    Unchanged(StoreKey),
    /// Value cleared with no safe fallback, or undecodable.
    Discarded(StoreKey),
    /// Session keys never cross devices.
    SessionKeyIgnored(StoreKey),
    /// Kill switch bumped; the local session was dropped.
    KillSwitch {
        /// Whether a user was logged in.
        logged_out: bool,
    },
    /// Key not known to this build.
    UnknownKey,
}

impl MergeOutcome {
    /// Returns true if local state changed.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Applied(_) | Self::KillSwitch { .. })
    }
}

/// Merges one remote change into local state.
///
/// A cleared value resets record collections to empty and the working entry
/// to blank; other keys keep their local value. Values are compared after
/// decoding, so formatting differences never count as a change.
pub fn merge_remote(
    state: &mut AppState,
    session: &mut SessionState,
    change: RemoteChange,
    today: NaiveDate,
) -> MergeOutcome {
    let Some(key) = StoreKey::from_wire(&change.key) else {
        debug!(key = %change.key, "ignoring unknown remote key");
        return MergeOutcome::UnknownKey;
    };
    if key.is_session_scoped() {
        debug!(%key, "ignoring remote session key");
        return MergeOutcome::SessionKeyIgnored(key);
    }
    if key == StoreKey::KillSwitch {
        let logged_out = state.invalidate_session(session, today);
        return MergeOutcome::KillSwitch { logged_out };
    }

    let outcome = match change.value {
        None | Some(Value::Null) => match state.reset_to_fallback(key, today) {
            Some(true) => MergeOutcome::Applied(key),
            Some(false) => MergeOutcome::Unchanged(key),
            None => MergeOutcome::Discarded(key),
        },
        Some(value) => match state.replace_value(key, value) {
            Ok(true) => MergeOutcome::Applied(key),
            Ok(false) => MergeOutcome::Unchanged(key),
            Err(e) => {
                warn!(%key, error = %e, "discarding malformed remote value");
                MergeOutcome::Discarded(key)
            }
        },
    };
    debug!(%key, ?outcome, "remote change merged");
    outcome
}
