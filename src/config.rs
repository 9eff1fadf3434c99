//! Run configuration
//!
//! Every field has a default, so an empty TOML file is a valid config:
//!
//! ```toml
//! concurrency = 4
//! unknown_subtype = "fallback"   # or "skip"
//! fallback_abbreviation = "OTRO"
//!
//! [subtypes]
//! 14 = "AUT"
//! ```

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::subtype::{SubtypeResolver, SubtypeTable, UnknownSubtypePolicy};

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads used to merge groups
    pub concurrency: usize,
    /// Handling of subtype codes missing from the table
    pub unknown_subtype: UnknownSubtypePolicy,
    /// Abbreviation used under [`UnknownSubtypePolicy::Fallback`]
    pub fallback_abbreviation: String,
    /// Extra or replacement entries for the subtype table
    pub subtypes: BTreeMap<String, String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
            unknown_subtype: UnknownSubtypePolicy::Skip,
            fallback_abbreviation: "OTHER".to_string(),
            subtypes: BTreeMap::new(),
        }
    }
}

impl BatchConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.fallback_abbreviation.trim().is_empty() {
            return Err(Error::Config("fallback_abbreviation must not be empty".to_string()));
        }
        for (code, abbrev) in &self.subtypes {
            let code = code.trim();
            if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Config(format!("subtype code {:?} is not numeric", code)));
            }
            if abbrev.trim().is_empty() {
                return Err(Error::Config(format!("subtype {} has an empty abbreviation", code)));
            }
        }
        Ok(())
    }

    /// Resolver built from the standard table plus configured overrides
    pub fn subtype_resolver(&self) -> SubtypeResolver {
        SubtypeResolver::new(
            SubtypeTable::with_overrides(&self.subtypes),
            self.unknown_subtype,
            self.fallback_abbreviation.trim(),
        )
    }
}
