pub mod chunk;
pub mod layout;

pub use chunk::{chunk_text, document_chunks};
pub use layout::{read_document, LoadedDocument};
