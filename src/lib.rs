pub mod assign;
pub mod config;
pub mod consolidate;
pub mod core;
pub mod detect;
pub mod error;
pub mod export;
pub mod persist;
pub mod pipeline;
pub mod reader;
pub mod reconstruct;
pub mod session;

pub use config::RedactConfig;
pub use crate::core::label::EntityLabel;
pub use crate::core::model::{CanonicalEntity, DetectedSpan, Document};
pub use error::{PseudoError, Result};
pub use session::Session;
