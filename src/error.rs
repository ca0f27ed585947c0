use std::path::PathBuf;

use thiserror::Error;

use crate::core::label::EntityLabel;

pub type Result<T> = std::result::Result<T, PseudoError>;

#[derive(Debug, Error)]
pub enum PseudoError {
    #[error("unknown entity label: {0}")]
    UnknownLabel(String),

    #[error("no replacement generator for label {0}")]
    UnsupportedLabel(EntityLabel),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("output directory is not set")]
    MissingOutputDir,

    #[error("output directory does not exist: {}", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("no entities available for redaction")]
    NoEntities,

    #[error("unsupported document type '{extension}' for {}", path.display())]
    UnsupportedDocument { path: PathBuf, extension: String },

    #[error("failed to read document {}: {message}", path.display())]
    UnreadableDocument { path: PathBuf, message: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
