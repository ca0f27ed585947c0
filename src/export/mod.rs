pub mod json_export;
pub mod keys_export;
pub mod text_export;

use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Document;

pub use json_export::JsonExporter;
pub use keys_export::{KeyRow, KeysExporter};
pub use text_export::TextExporter;

/// A rendition of a redacted document; returns the written path.
pub trait Exporter {
    fn export(&self, stem: &str, document: &Document) -> Result<PathBuf>;
}
