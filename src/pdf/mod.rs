//! PDF manipulation module

pub mod assemble;
pub mod embed;
pub mod metadata;
pub mod pages;

// Re-export commonly used items
pub use assemble::{assemble, OUTPUT_FILE_NAME};
pub use embed::{embed_image, EmbeddedImage};
pub use metadata::{inspect, inspect_file, PdfSummary};
pub use pages::append_pages;
