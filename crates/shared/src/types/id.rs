//! Typed IDs for type-safe record references.
//!
//! Records persisted in the key-value store are identified by millisecond
//! stamps (the identifiers other devices already wrote into the shared table),
//! so the wrappers here hold an `i64` rather than a UUID. Session identities
//! never leave the machine and use UUIDs.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Returns a strictly increasing millisecond stamp.
///
/// Two calls within the same millisecond yield consecutive values.
#[must_use]
pub fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return candidate,
            Err(current) => last = current,
        }
    }
}

/// Macro to generate stamp-based ID wrappers.
macro_rules! stamp_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates a new ID from the current millisecond stamp.
            #[must_use]
            pub fn new() -> Self {
                Self(next_stamp())
            }

            /// Returns the inner stamp.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

stamp_id!(EntryId, "Unique identifier for a shift entry.");
stamp_id!(OrderId, "Unique identifier for a supplier order.");
stamp_id!(DebtorId, "Unique identifier for a customer debt account.");

/// Unique identifier for a local session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
