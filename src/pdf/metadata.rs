//! PDF metadata extraction

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};

const MAX_TREE_DEPTH: usize = 64;

/// Summary of a PDF document
#[derive(Debug, Clone, PartialEq)]
pub struct PdfSummary {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Effective MediaBox (width, height) in points of each page, in order
    pub page_sizes: Vec<(f64, f64)>,
    /// Producer string from the Info dictionary (if present)
    pub producer: Option<String>,
    /// Document title (if present)
    pub title: Option<String>,
}

/// Summarise a PDF held in memory
pub fn inspect(bytes: &[u8]) -> Result<PdfSummary> {
    let doc = Document::load_mem(bytes)?;
    summarise(&doc)
}

/// Summarise a PDF file
pub fn inspect_file(path: &Path) -> Result<PdfSummary> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    let doc = Document::load(path)?;
    summarise(&doc)
}

fn summarise(doc: &Document) -> Result<PdfSummary> {
    let page_sizes = doc
        .get_pages()
        .into_values()
        .map(|page_id| page_size(doc, page_id))
        .collect::<Result<Vec<_>>>()?;

    Ok(PdfSummary {
        page_count: page_sizes.len(),
        page_sizes,
        producer: info_string(doc, b"Producer"),
        title: info_string(doc, b"Title"),
    })
}

/// Width and height of a page's MediaBox, following the page tree upward
fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f64, f64)> {
    let mut node_id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(node_id)?;
        if let Ok(media_box) = node.get(b"MediaBox") {
            let media_box = match media_box {
                Object::Reference(id) => doc.get_object(*id)?,
                other => other,
            };
            let values = media_box
                .as_array()?
                .iter()
                .map(as_number)
                .collect::<Option<Vec<f64>>>()
                .filter(|v| v.len() == 4)
                .ok_or_else(|| Error::General(format!("Malformed MediaBox on page {:?}", page_id)))?;
            return Ok(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()));
        }
        node_id = node.get(b"Parent")?.as_reference()?;
    }
    Err(Error::General(format!("No MediaBox found for page {:?}", page_id)))
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).ok()?.as_str().ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_nonexistent_file() {
        let result = inspect_file(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn test_inspect_garbage() {
        assert!(matches!(inspect(b"not a pdf").unwrap_err(), Error::Pdf(_)));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(as_number(&Object::Integer(3)), Some(3.0));
        assert_eq!(as_number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(as_number(&Object::Null), None);
    }
}
