//! Sentence-aware text chunking.
//!
//! Long documents are cut into segments no longer than a character bound,
//! preferring to end each segment on a period, then on a newline, and only
//! falling back to a hard cut when neither occurs inside the window.

/// Split `text` into trimmed, non-empty chunks of at most `max_chars` characters.
///
/// Lengths are counted in `char`s so a cut never lands inside a multi-byte
/// sequence. A `max_chars` of 0 is treated as 1.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        if len - start <= max_chars {
            chunks.push(collect_trimmed(&chars[start..]));
            break;
        }

        // last index whose inclusion keeps the chunk within bounds
        let window_end = start + max_chars - 1;
        let split_at = find_boundary(&chars, start, window_end, '.')
            .or_else(|| find_boundary(&chars, start, window_end, '\n'))
            .unwrap_or(window_end);

        chunks.push(collect_trimmed(&chars[start..=split_at]));
        start = split_at + 1;
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

/// Last position of `needle` in `(start, window_end]`.
///
/// A match at `start` itself does not count; it would produce a one-character
/// chunk made only of the boundary and stall progress on clustered periods.
fn find_boundary(chars: &[char], start: usize, window_end: usize, needle: char) -> Option<usize> {
    (start + 1..=window_end)
        .rev()
        .find(|&i| chars[i] == needle)
}

fn collect_trimmed(chars: &[char]) -> String {
    let s: String = chars.iter().collect();
    s.trim().to_string()
}
