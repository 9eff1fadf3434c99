//! Subtype code → document abbreviation lookup

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Built-in codes used by the radicación ledger
const STANDARD_SUBTYPES: [(&str, &str); 14] = [
    ("0", "FAC"),
    ("1", "HEV"),
    ("2", "EPI"),
    ("3", "PDX"),
    ("4", "DQX"),
    ("5", "RAN"),
    ("6", "CRC"),
    ("7", "TAP"),
    ("8", "TNA"),
    ("9", "FMO"),
    ("10", "OPF"),
    ("11", "HAM"),
    ("12", "ADRES"),
    ("13", "PDE"),
];

/// What to do with a group whose subtype code is not in the table
///
/// Applied identically to every group in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownSubtypePolicy {
    /// Skip the group and report it
    #[default]
    Skip,
    /// Name the output with the fallback abbreviation and keep going
    Fallback,
}

/// Immutable mapping from subtype code to abbreviation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtypeTable {
    entries: BTreeMap<String, String>,
}

impl SubtypeTable {
    /// The fixed table for codes `0` through `13`
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_SUBTYPES
                .iter()
                .map(|(code, abbrev)| (code.to_string(), abbrev.to_string()))
                .collect(),
        }
    }

    /// Standard table with `overrides` added on top
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::standard();
        for (code, abbrev) in overrides {
            table
                .entries
                .insert(crate::naming::normalize_subtype(code.trim()), abbrev.trim().to_string());
        }
        table
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves subtype codes under a single, run-wide policy
#[derive(Debug, Clone)]
pub struct SubtypeResolver {
    table: SubtypeTable,
    policy: UnknownSubtypePolicy,
    fallback: String,
}

impl SubtypeResolver {
    pub fn new(table: SubtypeTable, policy: UnknownSubtypePolicy, fallback: impl Into<String>) -> Self {
        Self {
            table,
            policy,
            fallback: fallback.into(),
        }
    }

    pub fn policy(&self) -> UnknownSubtypePolicy {
        self.policy
    }

    /// Abbreviation for `code`
    ///
    /// Unknown codes return [`Error::UnknownSubtype`] under
    /// [`UnknownSubtypePolicy::Skip`] and the fallback abbreviation under
    /// [`UnknownSubtypePolicy::Fallback`].
    pub fn resolve(&self, code: &str) -> Result<&str> {
        match (self.table.get(code), self.policy) {
            (Some(abbrev), _) => Ok(abbrev),
            (None, UnknownSubtypePolicy::Fallback) => Ok(&self.fallback),
            (None, UnknownSubtypePolicy::Skip) => Err(Error::UnknownSubtype {
                code: code.to_string(),
            }),
        }
    }
}
