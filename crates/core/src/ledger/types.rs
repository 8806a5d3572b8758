//! Shift kinds and their persisted labels.
//!
//! Labels are stored in Arabic, the language of the shop. English names are
//! accepted on input so configuration and scripts can use them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::LedgerError;

/// A work period within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShiftKind {
    /// Morning shift.
    Morning,
    /// Evening shift.
    Evening,
    /// Night shift.
    Night,
    /// Management view, used by super users.
    Admin,
}

impl ShiftKind {
    /// All shift kinds in display order.
    pub const ALL: [Self; 4] = [Self::Morning, Self::Evening, Self::Night, Self::Admin];

    /// Returns the persisted label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Morning => "صباحي",
            Self::Evening => "مسائي",
            Self::Night => "ليلي",
            Self::Admin => "إدارة",
        }
    }

    /// Returns the English name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ShiftKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.label() == s || k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| LedgerError::UnknownShift(s.to_string()))
    }
}

impl Serialize for ShiftKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ShiftKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for an optional shift stored as `""` when unassigned.
pub mod optional_shift {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ShiftKind;

    /// Writes the label, or an empty string for `None`.
    pub fn serialize<S: Serializer>(
        shift: &Option<ShiftKind>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(shift.map_or("", ShiftKind::label))
    }

    /// Reads a label; empty strings and null become `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ShiftKind>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}
