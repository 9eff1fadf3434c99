//! Grouping of parsed documents by (consecutive, subtype)
//!
//! Inside a group the base document (no fragment) comes first, then the
//! numbered fragments in ascending order. Documents with the same fragment
//! (typically re-scans such as `5.2 (2).pdf`) keep their upload order and are
//! all merged.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::document::RawDocument;
use crate::error::Result;
use crate::naming::ParsedIdentity;
use crate::reference::ReferenceTable;

/// A document whose name parsed, tagged with its upload position
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub position: usize,
    pub identity: ParsedIdentity,
    pub document: RawDocument,
}

/// Grouping key; orders by consecutive, then numerically by subtype
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub consecutive_id: u32,
    pub subtype_code: String,
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Codes have no leading zeros, so shorter means smaller
        self.consecutive_id
            .cmp(&other.consecutive_id)
            .then_with(|| self.subtype_code.len().cmp(&other.subtype_code.len()))
            .then_with(|| self.subtype_code.cmp(&other.subtype_code))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.consecutive_id, self.subtype_code)
    }
}

/// One member of a group
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub fragment_ordinal: Option<u32>,
    /// Upload position, used to order re-scans of the same fragment
    pub position: usize,
    pub document: RawDocument,
}

/// Documents sharing a (consecutive, subtype) pair, in merge order
#[derive(Debug, Clone)]
pub struct DocumentGroup {
    pub key: GroupKey,
    pub members: Vec<GroupMember>,
}

impl DocumentGroup {
    pub fn consecutive_id(&self) -> u32 {
        self.key.consecutive_id
    }

    pub fn subtype_code(&self) -> &str {
        &self.key.subtype_code
    }

    /// Member names in merge order
    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.document.name.as_str()).collect()
    }

    /// Label used as the subject of diagnostics about this group
    pub fn label(&self) -> String {
        format!("{} [{}]", self.key, self.member_names().join(", "))
    }
}

/// A group's consecutive id looked up in the reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    pub consecutive_id: u32,
    pub record_number: String,
}

/// Partition documents into groups
///
/// Groups come back sorted by key and members sorted by
/// (fragment, upload position), so the result does not depend on the order
/// of `documents`.
pub fn group_documents(documents: Vec<ParsedDocument>) -> Vec<DocumentGroup> {
    let mut groups: BTreeMap<GroupKey, Vec<GroupMember>> = BTreeMap::new();

    for parsed in documents {
        let key = GroupKey {
            consecutive_id: parsed.identity.consecutive_id,
            subtype_code: parsed.identity.subtype_code,
        };
        groups.entry(key).or_default().push(GroupMember {
            fragment_ordinal: parsed.identity.fragment_ordinal,
            position: parsed.position,
            document: parsed.document,
        });
    }

    groups
        .into_iter()
        .map(|(key, mut members)| {
            // None (base document) sorts before Some(_)
            members.sort_by_key(|m| (m.fragment_ordinal, m.position));
            DocumentGroup { key, members }
        })
        .collect()
}

/// Look up the group's record number
pub fn resolve_group(group: &DocumentGroup, table: &ReferenceTable) -> Result<ResolvedRecord> {
    let record_number = table.resolve(group.consecutive_id())?;
    Ok(ResolvedRecord {
        consecutive_id: group.consecutive_id(),
        record_number: record_number.to_string(),
    })
}
