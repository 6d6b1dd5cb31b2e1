//! Assembling images and existing PDFs into one output document
//!
//! Image pages come first, laid out `images_per_page` at a time in input
//! order. Every page of every supplied PDF follows, in input order. Any
//! failure discards the whole document.

use chrono::Utc;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::input::{ImageKind, InputFile, InputKind};
use crate::layout::{fit_image, slot_rect, PageDimensions, Rect};
use crate::options::{Border, LayoutOptions};
use crate::pdf::embed::embed_image;
use crate::pdf::pages::append_pages;

/// File name offered for the merged result
pub const OUTPUT_FILE_NAME: &str = "combined-document.pdf";

const PRODUCER: &str = concat!("pdf-combine ", env!("CARGO_PKG_VERSION"));

/// Merge `files` into a single PDF and return its bytes.
///
/// # Example
///
/// ```no_run
/// use pdf_combine::{assemble, InputFile, LayoutOptions};
///
/// let files = vec![
///     InputFile::new("photo.jpg", "image/jpeg", std::fs::read("photo.jpg").unwrap()),
///     InputFile::new("report.pdf", "application/pdf", std::fs::read("report.pdf").unwrap()),
/// ];
///
/// let bytes = assemble(&files, &LayoutOptions::default()).expect("Failed to merge");
/// std::fs::write("combined-document.pdf", bytes).unwrap();
/// ```
pub fn assemble(files: &[InputFile], options: &LayoutOptions) -> Result<Vec<u8>> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }

    let options = options.clamped();

    let mut images: Vec<(&InputFile, ImageKind)> = Vec::new();
    let mut pdfs: Vec<&InputFile> = Vec::new();
    for file in files {
        match file.kind() {
            Some(InputKind::Image(kind)) => images.push((file, kind)),
            Some(InputKind::Document) => pdfs.push(file),
            None => warn!(
                "Skipping {}: {} is neither an image nor a PDF",
                file.name(),
                file.info.media_type
            ),
        }
    }

    let mut output = OutputDocument::new();

    let page = PageDimensions::a4().oriented(options.orientation);
    for chunk in images.chunks(options.images_per_page.count()) {
        output.add_image_page(&page, chunk, &options)?;
    }
    let image_pages = output.kids.len();

    for file in pdfs {
        let page_ids = append_pages(&mut output.doc, file)?;
        output.adopt(file, page_ids)?;
    }

    info!(
        "Assembled {} page(s): {} from {} image(s), {} from PDFs",
        output.kids.len(),
        image_pages,
        images.len(),
        output.kids.len() - image_pages
    );

    output.finish()
}

/// Document under construction, owned by a single merge call
struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl OutputDocument {
    fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        // Reserved up front so pages can point at it; filled in by finish()
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Lay out one group of images on a fresh page
    fn add_image_page(
        &mut self,
        page: &PageDimensions,
        chunk: &[(&InputFile, ImageKind)],
        options: &LayoutOptions,
    ) -> Result<()> {
        let mut xobjects = Dictionary::new();
        let mut content = String::new();

        for (slot, (file, kind)) in chunk.iter().enumerate() {
            let embedded = embed_image(&mut self.doc, file, kind)?;
            let target = slot_rect(page, &options.margins, options.images_per_page, slot);
            let fitted = fit_image(
                embedded.width,
                embedded.height,
                &target,
                options.border.active_width(),
            );

            let name = format!("Im{}", slot + 1);
            xobjects.set(name.as_str(), Object::Reference(embedded.id));

            if let Some(border_rect) = fitted.border {
                content.push_str(&border_operators(&border_rect, &options.border));
            }
            content.push_str(&image_operators(&name, &fitted.image));

            debug!(
                "Placed {} ({}x{} px) in slot {} at {:.1},{:.1} size {:.1}x{:.1}",
                file.name(),
                embedded.width,
                embedded.height,
                slot,
                fitted.image.x,
                fitted.image.y,
                fitted.image.width,
                fitted.image.height
            );
        }

        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width.pt() as f32),
                Object::Real(page.height.pt() as f32),
            ],
            "Resources" => dictionary! {
                "XObject" => xobjects,
            },
            "Contents" => content_id,
        });
        self.kids.push(page_id);

        Ok(())
    }

    /// Hang copied pages under our page tree, after everything added so far
    fn adopt(&mut self, file: &InputFile, page_ids: Vec<ObjectId>) -> Result<()> {
        for &page_id in &page_ids {
            self.doc
                .get_dictionary_mut(page_id)
                .map_err(|source| Error::Document {
                    name: file.name().to_string(),
                    source,
                })?
                .set("Parent", Object::Reference(self.pages_id));
        }
        self.kids.extend(page_ids);
        Ok(())
    }

    /// Write the page tree, catalog and info dictionary, then serialise
    fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();

        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => self.kids.len() as i64,
                "Kids" => kids,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });

        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()
            ),
        });

        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        // Drops whatever the source PDFs' catalogs referenced (outlines etc.)
        self.doc.prune_objects();
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| Error::Save(e.to_string()))?;
        Ok(bytes)
    }
}

/// Content stream operators stroking `rect` with the border's colour and width
fn border_operators(rect: &Rect, border: &Border) -> String {
    let (r, g, b) = border.color.unit();
    format!(
        "q\n{:.4} {:.4} {:.4} RG\n{:.3} w\n{:.3} {:.3} {:.3} {:.3} re\nS\nQ\n",
        r, g, b, border.width, rect.x, rect.y, rect.width, rect.height
    )
}

/// Content stream operators painting image XObject `name` into `rect`
fn image_operators(name: &str, rect: &Rect) -> String {
    format!(
        "q\n{:.3} 0 0 {:.3} {:.3} {:.3} cm\n/{} Do\nQ\n",
        rect.width, rect.height, rect.x, rect.y, name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Rgb;

    #[test]
    fn test_empty_input_fails() {
        let err = assemble(&[], &LayoutOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NoFiles));
    }

    #[test]
    fn test_only_unclassified_files_gives_empty_document() {
        // Partitioning drops them silently; validation is the caller's job
        let files = vec![InputFile::new("notes.txt", "text/plain", b"hi".to_vec())];
        let bytes = assemble(&files, &LayoutOptions::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 0);
    }

    #[test]
    fn test_image_operators() {
        let rect = Rect { x: 10.0, y: 20.5, width: 100.0, height: 50.25 };
        assert_eq!(
            image_operators("Im2", &rect),
            "q\n100.000 0 0 50.250 10.000 20.500 cm\n/Im2 Do\nQ\n"
        );
    }

    #[test]
    fn test_border_operators() {
        let rect = Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 };
        let border = Border {
            enabled: true,
            width: 2.0,
            color: Rgb { r: 255, g: 0, b: 0 },
        };
        let ops = border_operators(&rect, &border);
        assert!(ops.contains("1.0000 0.0000 0.0000 RG"));
        assert!(ops.contains("2.000 w"));
        assert!(ops.contains("0.000 0.000 10.000 10.000 re\nS"));
    }
}
