use unicode_normalization::UnicodeNormalization;

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '\u{2010}' | '\u{2011}' | '\u{2013}' | '\u{2014}')
}

/// Comparison form of a surface text: NFKC, separators removed, lower case.
///
/// Used for exclusion matching and similarity scoring only; identity keys
/// keep the surface text.
pub fn normalize_text(text: &str) -> String {
    text.nfkc()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
