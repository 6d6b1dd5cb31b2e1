//! Input files and their validation
//!
//! Validation only looks at metadata (name, declared media type, size). The
//! contents are read after a file has been accepted.

use std::path::Path;

use crate::error::{Error, Result};

/// Largest accepted input, 100 MiB
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Media types accepted by [`validate`]
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

/// File-name extensions accepted by [`validate`] (lower-case, with the dot)
pub const ACCEPTED_EXTENSIONS: &[&str] =
    &[".pdf", ".jpg", ".jpeg", ".png", ".jpe", ".jif", ".jfif"];

/// Raster image encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    /// Any other `image/*` subtype; cannot be embedded
    Other(String),
}

/// What an input contributes to the output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Placed into a layout slot
    Image(ImageKind),
    /// Existing PDF whose pages are appended verbatim
    Document,
}

impl InputKind {
    /// Classify a declared media type. Returns `None` for types that are
    /// neither images nor PDF.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        if media_type == "application/pdf" {
            return Some(InputKind::Document);
        }
        let subtype = media_type.strip_prefix("image/")?;
        Some(InputKind::Image(match subtype {
            "jpeg" => ImageKind::Jpeg,
            "png" => ImageKind::Png,
            other => ImageKind::Other(other.to_string()),
        }))
    }
}

/// Metadata describing a candidate input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub media_type: String,
    /// Size in bytes
    pub size: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size,
        }
    }

    /// Read metadata for a file on disk without loading its contents
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = media_type_for_name(&name);
        Ok(Self::new(name, media_type, metadata.len()))
    }

    /// Lower-cased extension including the dot, taken from the last `.`
    pub fn extension(&self) -> Option<String> {
        self.name.rfind('.').map(|i| self.name[i..].to_lowercase())
    }

    pub fn kind(&self) -> Option<InputKind> {
        InputKind::from_media_type(&self.media_type)
    }

    /// Check size, media type and extension, in that order
    pub fn validate(&self) -> Result<()> {
        if self.size > MAX_FILE_SIZE {
            return Err(Error::Validation(format!(
                "{} is too large. Maximum size is 100MB",
                self.name
            )));
        }

        let type_ok = ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str());
        let extension_ok = self
            .extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));

        if !(type_ok && extension_ok) {
            return Err(Error::Validation(format!(
                "{} is not supported. Please use PDF, JPG, JPEG, or PNG files",
                self.name
            )));
        }

        Ok(())
    }
}

/// Validate a candidate file, which may be missing altogether
pub fn validate(file: Option<&FileInfo>) -> Result<()> {
    match file {
        Some(info) => info.validate(),
        None => Err(Error::Validation("Invalid file provided".to_string())),
    }
}

/// Guess a media type from a file name's extension
pub fn media_type_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" | "jif" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// An accepted input with its contents
#[derive(Debug, Clone)]
pub struct InputFile {
    pub info: FileInfo,
    pub data: Vec<u8>,
}

impl InputFile {
    /// Wrap in-memory contents; the size is taken from the data
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            info: FileInfo::new(name, media_type, data.len() as u64),
            data,
        }
    }

    /// Read the contents of a file whose metadata has already been accepted
    pub fn load(info: FileInfo, path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self { info, data })
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn kind(&self) -> Option<InputKind> {
        self.info.kind()
    }
}
