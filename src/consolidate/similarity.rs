use strsim::normalized_levenshtein;

// Length ratio from which a substring alignment is tried.
const PARTIAL_LENGTH_RATIO: f32 = 1.5;
const PARTIAL_SCALE: f32 = 0.9;
const NUMERIC_PENALTY: f32 = 10.0;

/// Similarity of two normalized texts on a 0-100 scale.
///
/// Best of the whole-string ratio and, for strings of clearly different
/// length, the best window alignment of the shorter inside the longer.
/// Differing digit sequences cost a fixed penalty.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 100.0;
    }

    let mut score = normalized_levenshtein(a, b) as f32;

    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let ratio = long.chars().count() as f32 / short.chars().count() as f32;
    if ratio >= PARTIAL_LENGTH_RATIO {
        score = score.max(partial_ratio(short, long) * PARTIAL_SCALE);
    }

    let mut score = score * 100.0;
    if numeric_mismatch(a, b) {
        score -= NUMERIC_PENALTY;
    }
    score.clamp(0.0, 100.0)
}

fn partial_ratio(short: &str, long: &str) -> f32 {
    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    long_chars
        .windows(width)
        .map(|window| {
            let window: String = window.iter().collect();
            normalized_levenshtein(short, &window) as f32
        })
        .fold(0.0, f32::max)
}

fn numeric_mismatch(a: &str, b: &str) -> bool {
    let digits_a: String = a.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits_b: String = b.chars().filter(|c| c.is_ascii_digit()).collect();
    !digits_a.is_empty() && !digits_b.is_empty() && digits_a != digits_b
}
