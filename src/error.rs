//! Error types for the radicación pipeline

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline
///
/// Only [`Error::ReferenceTableMalformed`], [`Error::EmptyBatch`] and the
/// setup errors (config, thread pool) abort a run. Everything else is
/// raised per item and turned into a [`crate::Diagnostic`] by the batch
/// orchestrator.
#[derive(Error, Debug)]
pub enum Error {
    /// Document name does not follow `<id>.<subtype>[.<n>][ (<dup>)].pdf`
    #[error("invalid name format: {name}")]
    NameFormatInvalid { name: String },

    /// Consecutive id missing from the reference table
    #[error("consecutive {id} has no entry in the reference table")]
    UnresolvedConsecutive { id: u32 },

    /// Subtype code missing from the subtype table
    #[error("unknown subtype code {code}")]
    UnknownSubtype { code: String },

    /// Output name cannot be used as a single file name (e.g. a record
    /// number containing `/`)
    #[error("output name {filename:?} is not a plain file name")]
    UnusableOutputName { filename: String },

    /// Reference payload is not a usable two-column table
    #[error("reference table malformed: {0}")]
    ReferenceTableMalformed(String),

    /// No documents were supplied
    #[error("empty batch: no documents were supplied")]
    EmptyBatch,

    /// PDF has no pages
    #[error("PDF has no pages: {0}")]
    EmptyPdf(String),

    /// PDF could not be parsed or has a broken structure
    #[error("invalid PDF {name}: {reason}")]
    InvalidPdf { name: String, reason: String },

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ReferenceTableMalformed(_)
                | Error::EmptyBatch
                | Error::Config(_)
                | Error::ThreadPool(_)
        )
    }
}
