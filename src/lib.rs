//! PDF Radicación Library
//!
//! Reconciles a batch of scanned PDFs against an invoice ledger and produces
//! one merged, renamed PDF per invoice document. This library provides
//! functionality to:
//! - Parse document names (`<consecutive>.<subtype>[.<fragment>].pdf`)
//! - Load the ledger (consecutive → record number) from a workbook
//! - Group documents by consecutive and subtype, in a fixed merge order
//! - Merge each group and name it `{abbreviation}_{provider}_{record}.pdf`
//! - Run a whole batch, reporting skipped items instead of aborting
//!
//! # Example
//!
//! ```no_run
//! use pdf_radicacion::{BatchConfig, BatchProcessor, RawDocument};
//!
//! let documents = vec![
//!     RawDocument::new("12.0.pdf", std::fs::read("12.0.pdf").unwrap()),
//!     RawDocument::new("12.1.pdf", std::fs::read("12.1.pdf").unwrap()),
//! ];
//! let reference = std::fs::read("facturas.xlsx").unwrap();
//!
//! let mut processor = BatchProcessor::new(&BatchConfig::default()).unwrap();
//! let report = processor.run(documents, &reference, "900364721").unwrap();
//!
//! println!("{}", report.summary());
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

pub mod batch;
pub mod bundle;
pub mod config;
pub mod document;
pub mod error;
pub mod grouping;
pub mod logging;
pub mod naming;
pub mod pdf;
pub mod reference;
pub mod subtype;

// Re-export commonly used items
pub use batch::{BatchProcessor, BatchReport, BatchStats, RunStage};
pub use config::BatchConfig;
pub use document::{Diagnostic, DiagnosticKind, OutputArtifact, RawDocument};
pub use error::{Error, Result};
pub use naming::{parse_document_name, ParsedIdentity};
pub use reference::ReferenceTable;
pub use subtype::{SubtypeResolver, SubtypeTable, UnknownSubtypePolicy};
