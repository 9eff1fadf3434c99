//! PDF metadata extraction

use lopdf::{Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
fn count_pages_from_catalog(doc: &Document, name: &str) -> Result<usize> {
    let broken = |reason: &str| Error::InvalidPdf {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let catalog_id = match doc.trailer.get(b"Root") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(broken("Root is not a reference")),
        Err(_) => return Err(broken("no Root in trailer")),
    };

    let pages_id = match doc.get_dictionary(catalog_id)?.get(b"Pages") {
        Ok(Object::Reference(id)) => *id,
        Ok(_) => return Err(broken("Pages is not a reference")),
        Err(_) => return Err(broken("no Pages in catalog")),
    };

    match doc.get_dictionary(pages_id)?.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(broken("Count is not a non-negative integer")),
        Err(_) => Err(broken("no Count in Pages")),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
}

fn load(name: &str, bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| Error::InvalidPdf {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Extract metadata from in-memory PDF bytes
pub fn extract_metadata(name: &str, bytes: &[u8]) -> Result<PdfMetadata> {
    let doc = load(name, bytes)?;
    let page_count = count_pages_from_catalog(&doc, name)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(name.to_string()));
    }

    let info = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .ok();

    let text_entry = |key: &[u8]| {
        info.and_then(|dict| dict.get(key).ok())
            .and_then(|obj| obj.as_str().ok())
            .and_then(|bytes| String::from_utf8(bytes.to_vec()).ok())
    };

    Ok(PdfMetadata {
        page_count,
        title: text_entry(b"Title"),
        author: text_entry(b"Author"),
    })
}

/// Count the number of pages in in-memory PDF bytes
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(name: &str, bytes: &[u8]) -> Result<usize> {
    let doc = load(name, bytes)?;
    let page_count = count_pages_from_catalog(&doc, name)?;

    if page_count == 0 {
        return Err(Error::EmptyPdf(name.to_string()));
    }

    Ok(page_count)
}
