//! PDF Combine Library
//!
//! Builds a single PDF from a mix of raster images and existing PDF files.
//! This library provides functionality to:
//! - Validate candidate input files by size, media type and extension
//! - Lay out 1, 2 or 4 images per page with margins and an optional border
//! - Append every page of supplied PDFs after the image pages
//! - Inspect the resulting document (page count, page sizes)
//!
//! # Example
//!
//! ```no_run
//! use pdf_combine::{assemble, ImagesPerPage, InputFile, LayoutOptions, Orientation};
//!
//! let options = LayoutOptions {
//!     images_per_page: ImagesPerPage::Two,
//!     orientation: Orientation::Landscape,
//!     ..Default::default()
//! };
//!
//! let files = vec![
//!     InputFile::new("front.png", "image/png", std::fs::read("front.png").unwrap()),
//!     InputFile::new("back.png", "image/png", std::fs::read("back.png").unwrap()),
//! ];
//!
//! let pdf = assemble(&files, &options).expect("Failed to combine files");
//! std::fs::write("combined-document.pdf", pdf).unwrap();
//! ```

pub mod error;
pub mod input;
pub mod layout;
pub mod logger;
pub mod options;
pub mod pdf;

// Re-export commonly used items
pub use error::{Error, Result};
pub use input::{validate, FileInfo, ImageKind, InputFile, InputKind};
pub use layout::{
    fit_image, slot_rect, ImagesPerPage, Length, Margins, Orientation, PageDimensions, Rect,
};
pub use options::{Border, LayoutOptions, Rgb};
pub use pdf::{assemble, OUTPUT_FILE_NAME};
