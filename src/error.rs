//! Error types for the PDF combine library

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF combine library
#[derive(Error, Debug)]
pub enum Error {
    /// File rejected before it was accepted for merging
    #[error("{0}")]
    Validation(String),

    /// Image data could not be decoded or embedded
    #[error("Failed to embed image {name}: {reason}")]
    Embed { name: String, reason: String },

    /// Image subtype other than JPEG or PNG
    #[error("Failed to embed image {name}: unsupported image format ({media_type})")]
    UnsupportedImageFormat { name: String, media_type: String },

    /// Nothing to merge
    #[error("No files to merge. Please add at least one image or PDF file")]
    NoFiles,

    /// A supplied PDF could not be loaded or its pages copied
    #[error("Failed to process PDF {name}: {source}")]
    Document {
        name: String,
        #[source]
        source: lopdf::Error,
    },

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {0}")]
    EmptyPdf(String),

    /// Output document could not be serialised
    #[error("Failed to save merged document: {0}")]
    Save(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid layout configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Name of the input file this error concerns, when known
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Error::Embed { name, .. }
            | Error::UnsupportedImageFormat { name, .. }
            | Error::Document { name, .. }
            | Error::EmptyPdf(name) => Some(name),
            _ => None,
        }
    }
}
