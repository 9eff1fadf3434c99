//! Output artifacts: merging a resolved group and naming the result
//!
//! Output names follow `{abbreviation}_{provider}_{record}.pdf`. The provider
//! id is copied verbatim. Two groups can end up with the same name; the
//! later one (in group order) replaces the earlier one in the bundle and the
//! replacement is reported, never silent. A name that is not a single plain
//! file name (a record number holding `/`, say) is rejected before merging.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::document::OutputArtifact;
use crate::error::{Error, Result};
use crate::grouping::{DocumentGroup, ResolvedRecord};
use crate::pdf::{merge_pdf_bytes, MergeInput};

/// Final file name for a merged group
pub fn output_filename(abbreviation: &str, provider_id: &str, record_number: &str) -> String {
    format!("{}_{}_{}.pdf", abbreviation, provider_id, record_number)
}

/// Whether `name` can be written as-is inside an output directory
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Merge a resolved group into one named artifact
///
/// Members are concatenated in group order. Nothing is produced if any
/// member fails to parse.
pub fn build_artifact(
    group: &DocumentGroup,
    record: &ResolvedRecord,
    abbreviation: &str,
    provider_id: &str,
) -> Result<OutputArtifact> {
    let inputs: Vec<MergeInput<'_>> = group
        .members
        .iter()
        .map(|member| MergeInput {
            name: &member.document.name,
            bytes: &member.document.bytes,
        })
        .collect();

    let filename = output_filename(abbreviation, provider_id, &record.record_number);
    if !is_plain_file_name(&filename) {
        return Err(Error::UnusableOutputName { filename });
    }

    let merged = merge_pdf_bytes(&inputs)?;

    debug!(
        group = %group.key,
        members = group.members.len(),
        pages = merged.pages,
        filename = %filename,
        "group merged"
    );

    Ok(OutputArtifact {
        filename,
        content: merged.content,
        pages: merged.pages,
    })
}

/// Artifacts keyed by file name, remembering which group produced each
#[derive(Debug, Default)]
pub struct ArtifactBundle {
    entries: BTreeMap<String, (String, OutputArtifact)>,
}

impl ArtifactBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact produced by the group labelled `source`
    ///
    /// Returns the label of the group whose artifact was replaced, if the
    /// name was already taken.
    pub fn insert(&mut self, source: impl Into<String>, artifact: OutputArtifact) -> Option<String> {
        let source = source.into();
        let filename = artifact.filename.clone();
        let replaced = self
            .entries
            .insert(filename.clone(), (source.clone(), artifact))
            .map(|(previous, _)| previous);

        if let Some(previous) = &replaced {
            warn!(
                filename = %filename,
                replaced = %previous,
                by = %source,
                "output name collision, later group overwrites earlier one"
            );
        }
        replaced
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Artifacts sorted by file name
    pub fn into_artifacts(self) -> Vec<OutputArtifact> {
        self.entries.into_values().map(|(_, artifact)| artifact).collect()
    }
}
