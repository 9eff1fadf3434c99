//! PDF merging functionality using lopdf

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in broken files
const MAX_TREE_DEPTH: usize = 64;

/// One source document to merge
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    /// Name used in error messages
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// Result of a merge
#[derive(Debug, Clone)]
pub struct MergedPdf {
    pub content: Vec<u8>,
    pub pages: usize,
}

/// Merge PDF documents into one, pages in input order
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
///
/// Every source keeps its own page order; sources are appended one after
/// the other with nothing inserted between them. The call fails as a whole if
/// any source cannot be parsed or has no pages.
pub fn merge_pdf_bytes(inputs: &[MergeInput<'_>]) -> Result<MergedPdf> {
    if inputs.is_empty() {
        return Err(Error::EmptyPdf("no input documents to merge".to_string()));
    }

    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let mut doc = Document::load_mem(input.bytes).map_err(|e| Error::InvalidPdf {
            name: input.name.to_string(),
            reason: e.to_string(),
        })?;

        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(input.name.to_string()));
        }

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        for &page_id in pages.values() {
            inherit_page_attributes(&mut doc, page_id).map_err(|e| Error::InvalidPdf {
                name: input.name.to_string(),
                reason: e.to_string(),
            })?;
        }

        debug!(source = input.name, pages = pages.len(), "collected source pages");
        page_ids.extend(pages.into_values());

        // The old catalog and page tree are replaced by a fresh one below
        objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_catalog_or_page_tree_node(object)),
        );
    }

    let mut merged_doc = Document::with_version("1.5");

    // Add all collected objects FIRST
    merged_doc.objects.extend(objects);

    // new_object_id() must hand out ids above everything just added
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    // Update parent references for all pages
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    merged_doc.compress();

    let mut content = Vec::new();
    merged_doc.save_to(&mut content)?;

    Ok(MergedPdf {
        content,
        pages: page_ids.len(),
    })
}

/// Copy attributes the page inherits from its ancestors onto the page itself
///
/// Needed because the ancestors are dropped when the page is moved under the
/// merged page tree.
fn inherit_page_attributes(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;

        while let Some(parent_id) = parent {
            if missing.is_empty() || depth >= MAX_TREE_DEPTH {
                break;
            }
            let node = doc.get_dictionary(parent_id)?;
            missing.retain(|key| match node.get(key) {
                Ok(value) => {
                    inherited.push((*key, value.clone()));
                    false
                }
                Err(_) => true,
            });
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
        }
    }

    if inherited.is_empty() {
        return Ok(());
    }

    let page = doc.get_dictionary_mut(page_id)?;
    for (key, value) in inherited {
        page.set(key.to_vec(), value);
    }

    Ok(())
}

fn is_catalog_or_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Pages") | Ok(b"Catalog")
        ),
        _ => false,
    }
}
