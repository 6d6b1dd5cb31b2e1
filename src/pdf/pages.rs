//! Copying every page of an existing PDF into the output document

use lopdf::{Document, Object, ObjectId};
use log::debug;

use crate::error::{Error, Result};
use crate::input::InputFile;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// Move all pages of `file` into `target`, in their original order.
///
/// The returned pages still need their `Parent` pointed at the target's page
/// tree. Objects are renumbered above `target.max_id` so nothing collides.
pub fn append_pages(target: &mut Document, file: &InputFile) -> Result<Vec<ObjectId>> {
    let name = file.name();
    let wrap = |source: lopdf::Error| Error::Document {
        name: name.to_string(),
        source,
    };

    let mut source = Document::load_mem(&file.data).map_err(wrap)?;

    // Renumber objects in this document to avoid conflicts
    source.renumber_objects_with(target.max_id + 1);

    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(Error::EmptyPdf(name.to_string()));
    }

    for &page_id in &page_ids {
        push_down_inherited(&mut source, page_id).map_err(wrap)?;
    }

    let max_id = source.max_id;
    for (object_id, object) in source.objects {
        // The old catalog and page tree nodes are replaced by the target's
        match object.type_name().unwrap_or(b"") {
            b"Catalog" | b"Pages" => {}
            _ => {
                target.objects.insert(object_id, object);
            }
        }
    }
    target.max_id = target.max_id.max(max_id);

    debug!("Copied {} page(s) from {}", page_ids.len(), name);
    Ok(page_ids)
}

/// Copy inherited attributes onto the page itself so it renders the same once
/// it is detached from its original page tree
fn push_down_inherited(doc: &mut Document, page_id: ObjectId) -> lopdf::Result<()> {
    let mut inherited = Vec::new();
    {
        let page = doc.get_dictionary(page_id)?;
        for key in INHERITABLE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = find_in_ancestors(doc, page.get(b"Parent").ok(), key) {
                inherited.push((key, value));
            }
        }
    }

    if !inherited.is_empty() {
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    Ok(())
}

fn find_in_ancestors(doc: &Document, parent: Option<&Object>, key: &[u8]) -> Option<Object> {
    let mut next = parent.and_then(|p| p.as_reference().ok());
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(next?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        next = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// Two pages sharing a MediaBox and Resources set on the Pages node
    fn pdf_with_inherited_box() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for n in 0..2 {
            let content_id = doc.add_object(Stream::new(
                lopdf::Dictionary::new(),
                format!("0 0 {} 10 re f", n + 1).into_bytes(),
            ));
            kids.push(Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            })));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => 2,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(400),
                ],
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_pages_keep_inherited_media_box() {
        let file = InputFile::new("shared.pdf", "application/pdf", pdf_with_inherited_box());
        let mut target = Document::with_version("1.7");
        target.new_object_id();

        let pages = append_pages(&mut target, &file).unwrap();
        assert_eq!(pages.len(), 2);

        for id in &pages {
            let page = target.get_dictionary(*id).unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media_box[2].as_i64().unwrap(), 300);
            assert!(page.has(b"Resources"));
        }
        // Renumbered above the objects already in the target
        assert!(pages.iter().all(|id| id.0 > 1));
        assert!(target.max_id >= pages.iter().map(|id| id.0).max().unwrap());
    }

    #[test]
    fn test_old_page_tree_not_copied() {
        let file = InputFile::new("shared.pdf", "application/pdf", pdf_with_inherited_box());
        let mut target = Document::with_version("1.7");
        append_pages(&mut target, &file).unwrap();

        let leftover = target
            .objects
            .values()
            .filter(|o| matches!(o.type_name(), Ok(b"Pages") | Ok(b"Catalog")))
            .count();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_garbage_is_document_error() {
        let file = InputFile::new("junk.pdf", "application/pdf", b"%PDF-1.4 nonsense".to_vec());
        let mut target = Document::with_version("1.7");
        let err = append_pages(&mut target, &file).unwrap_err();
        assert!(matches!(err, Error::Document { .. }));
        assert!(err.to_string().contains("junk.pdf"));
    }
}
