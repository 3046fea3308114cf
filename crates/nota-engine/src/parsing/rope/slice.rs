use xi_rope::Rope;

use super::span::Span;

/// Extracts the text for a span from the rope as an owned String.
///
/// This allocates; prefer working with spans where possible.
pub fn slice_to_string(rope: &Rope, sp: Span) -> String {
    rope.slice_to_cow(sp.start..sp.end).into_owned()
}

/// Extracts text for a span, truncating to at most `max` bytes with a "..."
/// suffix if needed. Truncation never splits a UTF-8 sequence.
///
/// Used for human-readable outlines and search excerpts.
pub fn preview(rope: &Rope, sp: Span, max: usize) -> String {
    let mut s = slice_to_string(rope, sp);
    if s.len() > max {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("...");
    }
    s
}

/// Like [`preview`], but folds the text onto one line: runs of whitespace
/// (newlines included) collapse to a single space and the ends are trimmed.
pub fn one_line_preview(rope: &Rope, sp: Span, max: usize) -> String {
    let folded = slice_to_string(rope, sp)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let rope = Rope::from(folded.as_str());
    preview(&rope, Span::new(0, folded.len()), max)
}
