//! Batch orchestration
//!
//! A run moves through `Idle → Loading → Parsing → Grouping → Merging → Done`.
//! Only the loading stage can fail the run (no documents, unreadable
//! reference table, worker pool setup). Later stages turn every bad document
//! or group into a [`Diagnostic`] and carry on, so each group ends with
//! exactly one artifact or exactly one diagnostic.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::bundle::{build_artifact, ArtifactBundle};
use crate::config::BatchConfig;
use crate::document::{Diagnostic, DiagnosticKind, OutputArtifact, RawDocument};
use crate::error::{Error, Result};
use crate::grouping::{group_documents, resolve_group, DocumentGroup, ParsedDocument};
use crate::naming::parse_document_name;
use crate::reference::ReferenceTable;
use crate::subtype::SubtypeResolver;

/// Stage of a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Loading,
    Parsing,
    Grouping,
    Merging,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Documents supplied
    pub documents: usize,
    /// Groups formed from documents with valid names
    pub groups: usize,
    /// Artifacts produced
    pub succeeded: usize,
    /// Documents and groups reported as diagnostics
    pub skipped: usize,
}

/// Everything a run hands back to the caller
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Sorted by file name
    pub artifacts: Vec<OutputArtifact>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// `"N succeeded, M skipped"`
    pub fn summary(&self) -> String {
        format!("{} succeeded, {} skipped", self.stats.succeeded, self.stats.skipped)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Drives one batch from raw uploads to named artifacts
pub struct BatchProcessor {
    resolver: SubtypeResolver,
    concurrency: usize,
    stage: RunStage,
}

impl BatchProcessor {
    /// Build a processor from a validated config
    pub fn new(config: &BatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_resolver(config.subtype_resolver(), config.concurrency))
    }

    pub fn with_resolver(resolver: SubtypeResolver, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
            stage: RunStage::Idle,
        }
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Run a batch against a reference workbook payload
    ///
    /// Fails only if `documents` is empty or `reference` is not a usable
    /// table; per-document and per-group problems end up in the report.
    pub fn run(
        &mut self,
        documents: Vec<RawDocument>,
        reference: &[u8],
        provider_id: &str,
    ) -> Result<BatchReport> {
        self.enter(RunStage::Loading);
        let loaded = self
            .check_documents(&documents)
            .and_then(|_| ReferenceTable::from_workbook_bytes(reference));
        let table = self.or_fail(loaded)?;
        self.process(documents, &table, provider_id)
    }

    /// Run a batch against an already loaded reference table
    pub fn run_with_table(
        &mut self,
        documents: Vec<RawDocument>,
        table: &ReferenceTable,
        provider_id: &str,
    ) -> Result<BatchReport> {
        self.enter(RunStage::Loading);
        let checked = self.check_documents(&documents);
        self.or_fail(checked)?;
        self.process(documents, table, provider_id)
    }

    fn check_documents(&self, documents: &[RawDocument]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyBatch);
        }
        Ok(())
    }

    fn process(
        &mut self,
        documents: Vec<RawDocument>,
        table: &ReferenceTable,
        provider_id: &str,
    ) -> Result<BatchReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("radicacion-merge-{}", i))
            .build()
            .map_err(Error::from);
        let pool = self.or_fail(pool)?;

        let mut stats = BatchStats {
            documents: documents.len(),
            ..Default::default()
        };
        info!(
            documents = stats.documents,
            references = table.len(),
            workers = self.concurrency,
            "batch loaded"
        );

        self.enter(RunStage::Parsing);
        let (parsed, mut diagnostics) = parse_documents(documents);

        self.enter(RunStage::Grouping);
        let groups = group_documents(parsed);
        stats.groups = groups.len();
        debug!(groups = stats.groups, "documents grouped");

        self.enter(RunStage::Merging);
        let resolver = &self.resolver;
        let outcomes: Vec<(String, std::result::Result<OutputArtifact, Diagnostic>)> = pool.install(|| {
            groups
                .into_par_iter()
                .map(|group| {
                    let label = group.label();
                    let outcome = process_group(&group, table, resolver, provider_id);
                    (label, outcome)
                })
                .collect()
        });

        // Outcomes are in group order, which makes collision handling
        // independent of merge completion order
        let mut bundle = ArtifactBundle::new();
        for (label, outcome) in outcomes {
            match outcome {
                Ok(artifact) => {
                    let filename = artifact.filename.clone();
                    if let Some(replaced) = bundle.insert(label.clone(), artifact) {
                        diagnostics.push(Diagnostic::new(
                            replaced,
                            DiagnosticKind::OutputOverwritten,
                            format!("output {} was overwritten by group {}", filename, label),
                        ));
                    }
                }
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        let artifacts = bundle.into_artifacts();
        stats.succeeded = artifacts.len();
        stats.skipped = diagnostics.len();

        self.enter(RunStage::Done);
        let report = BatchReport {
            artifacts,
            diagnostics,
            stats,
        };
        info!(
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            "batch finished: {}",
            report.summary()
        );

        Ok(report)
    }

    fn enter(&mut self, stage: RunStage) {
        debug!(from = %self.stage, to = %stage, "batch stage");
        self.stage = stage;
    }

    fn or_fail<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!(stage = %self.stage, error = %e, "batch failed");
            self.stage = RunStage::Failed;
        }
        result
    }
}

/// Parse every document name, routing failures to diagnostics
fn parse_documents(documents: Vec<RawDocument>) -> (Vec<ParsedDocument>, Vec<Diagnostic>) {
    let mut parsed = Vec::with_capacity(documents.len());
    let mut diagnostics = Vec::new();

    for (position, document) in documents.into_iter().enumerate() {
        match parse_document_name(&document.name) {
            Ok(identity) => parsed.push(ParsedDocument {
                position,
                identity,
                document,
            }),
            Err(e) => {
                warn!(name = %document.name, position, "skipping document: {}", e);
                diagnostics.push(Diagnostic::from_error(document.name.as_str(), &e));
            }
        }
    }

    (parsed, diagnostics)
}

/// Resolve, name and merge a single group
fn process_group(
    group: &DocumentGroup,
    table: &ReferenceTable,
    resolver: &SubtypeResolver,
    provider_id: &str,
) -> std::result::Result<OutputArtifact, Diagnostic> {
    let result = resolve_group(group, table).and_then(|record| {
        let abbreviation = resolver.resolve(group.subtype_code())?;
        build_artifact(group, &record, abbreviation, provider_id)
    });

    result.map_err(|e| {
        warn!(group = %group.key, "skipping group: {}", e);
        Diagnostic::from_error(group.label(), &e)
    })
}
