use crate::core::model::Document;

/// Preferred split points, strongest first.
pub const DEFAULT_ENDINGS: [&str; 2] = ["\n\n", "\n"];

/// Detection chunks of a document: blank-line separated blocks of its text,
/// each further bounded to `max_len` characters.
pub fn document_chunks(document: &Document, max_len: usize) -> Vec<String> {
    document
        .plain_text()
        .split("\n\n")
        .filter(|block| block.chars().count() > 1)
        .flat_map(|block| chunk_text(block, max_len, &DEFAULT_ENDINGS))
        .collect()
}

/// Splits `text` into pieces of at most `max_len` characters.
///
/// Each piece ends at the last preferred ending inside the limit when one
/// exists, otherwise exactly at the limit.
pub fn chunk_text(text: &str, max_len: usize, endings: &[&str]) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let limit = match rest.char_indices().nth(max_len) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..limit];
        let split = endings
            .iter()
            .find_map(|ending| window.rfind(ending).map(|idx| idx + ending.len()))
            .unwrap_or(limit);

        chunks.push(rest[..split].to_string());
        rest = &rest[split..];
    }
    chunks
}
