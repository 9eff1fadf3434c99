//! PDF manipulation module

pub mod merge;
pub mod metadata;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used items
pub use merge::{merge_pdf_bytes, MergeInput, MergedPdf};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
