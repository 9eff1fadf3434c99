//! Values exchanged with the caller: uploaded documents in, artifacts and
//! diagnostics out

use std::fmt;

use crate::error::Error;

/// A document as supplied by the caller
///
/// Two documents may carry the same name; they are still distinct inputs and
/// are identified by their upload position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    /// File name as uploaded (no directory part)
    pub name: String,
    /// PDF content
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// One merged, renamed output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// `{abbreviation}_{provider}_{record}.pdf`
    pub filename: String,
    /// Merged PDF bytes
    pub content: Vec<u8>,
    /// Number of pages in the merged document
    pub pages: usize,
}

/// Category of a skipped item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    NameFormatInvalid,
    UnresolvedConsecutive,
    UnknownSubtype,
    MergeFailed,
    /// A later group produced the same output filename and replaced this one
    OutputOverwritten,
    /// The output filename is not a plain file name
    UnusableOutputName,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::NameFormatInvalid => "invalid name",
            DiagnosticKind::UnresolvedConsecutive => "unresolved consecutive",
            DiagnosticKind::UnknownSubtype => "unknown subtype",
            DiagnosticKind::MergeFailed => "merge failed",
            DiagnosticKind::OutputOverwritten => "output overwritten",
            DiagnosticKind::UnusableOutputName => "unusable output name",
        };
        f.write_str(label)
    }
}

/// A skipped document or group, reported to the caller instead of aborting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Document name or group label the message is about
    pub subject: String,
    pub kind: DiagnosticKind,
    /// Human readable explanation
    pub message: String,
}

impl Diagnostic {
    pub fn new(subject: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }

    /// Build a diagnostic from a per-item error
    ///
    /// Errors without a dedicated kind (PDF parse failures, empty PDFs) are
    /// reported as [`DiagnosticKind::MergeFailed`].
    pub fn from_error(subject: impl Into<String>, err: &Error) -> Self {
        let kind = match err {
            Error::NameFormatInvalid { .. } => DiagnosticKind::NameFormatInvalid,
            Error::UnresolvedConsecutive { .. } => DiagnosticKind::UnresolvedConsecutive,
            Error::UnknownSubtype { .. } => DiagnosticKind::UnknownSubtype,
            Error::UnusableOutputName { .. } => DiagnosticKind::UnusableOutputName,
            _ => DiagnosticKind::MergeFailed,
        };
        Self::new(subject, kind, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.subject, self.kind, self.message)
    }
}
