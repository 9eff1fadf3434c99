//! Document name parsing
//!
//! Uploaded scans are named `<consecutive>.<subtype>[.<fragment>]*[ (<dup>)].pdf`:
//!
//! - `12.0.pdf` → consecutive 12, subtype 0
//! - `12.3.2.pdf` → consecutive 12, subtype 3, fragment 2
//! - `5.2 (2).pdf` → consecutive 5, subtype 2, re-scan number 2
//!
//! Numbers are ASCII digit runs only. The `.pdf` suffix is matched
//! case-insensitively (`12.0.PDF` is accepted) and whitespace around the
//! whole name is ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Identity extracted from a document name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedIdentity {
    /// Key into the reference table (always > 0)
    pub consecutive_id: u32,
    /// Subtype code without leading zeros (`"03"` becomes `"3"`)
    pub subtype_code: String,
    /// Last dotted fragment after the subtype, if any
    pub fragment_ordinal: Option<u32>,
    /// Parenthesized re-scan number, if any
    ///
    /// Only recorded. Re-scans sharing a fragment are ordered by upload
    /// position, not by this number.
    pub duplicate_index: Option<u32>,
}

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        Regex::new(r"(?i)^([0-9]+)\.([0-9]+)((?:\.[0-9]+)*)\s*(?:\(([0-9]+)\))?\.pdf$")
            .expect("document name grammar is a valid regex")
    })
}

/// Parse a document name into its identity
///
/// Returns [`Error::NameFormatInvalid`] when the name does not follow the
/// grammar, when a number does not fit in 32 bits, or when the consecutive
/// id is zero.
pub fn parse_document_name(name: &str) -> Result<ParsedIdentity> {
    let invalid = || Error::NameFormatInvalid {
        name: name.to_string(),
    };

    let caps = grammar().captures(name.trim()).ok_or_else(invalid)?;

    let consecutive_id: u32 = caps[1].parse().map_err(|_| invalid())?;
    if consecutive_id == 0 {
        return Err(invalid());
    }

    let subtype_code = normalize_subtype(&caps[2]);

    let fragment_ordinal = match caps[3].rsplit('.').next() {
        Some(last) if !last.is_empty() => Some(last.parse().map_err(|_| invalid())?),
        _ => None,
    };

    let duplicate_index = match caps.get(4) {
        Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
        None => None,
    };

    Ok(ParsedIdentity {
        consecutive_id,
        subtype_code,
        fragment_ordinal,
        duplicate_index,
    })
}

/// Strip leading zeros from a digit run, keeping a lone `"0"`
pub fn normalize_subtype(code: &str) -> String {
    let trimmed = code.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
