//! Text utilities
//!
//! All offsets used by the annotation layers are counted in Unicode code
//! points, so an astral character such as an emoji is a single unit.

/// Number of code points in `text`.
#[must_use]
pub fn string_length(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` after `at` code points. Offsets past the end split at the end.
#[must_use]
pub fn split_at_char(text: &str, at: usize) -> (&str, &str) {
    if at == 0 {
        return ("", text);
    }
    match text.char_indices().nth(at) {
        Some((idx, _)) => (&text[..idx], &text[idx..]),
        None => (text, ""),
    }
}

/// Code-point offset of a byte offset. The byte offset must be on a char boundary.
#[must_use]
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    string_length(&text[..byte_offset.min(text.len())])
}
