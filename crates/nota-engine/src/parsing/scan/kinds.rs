//! Delimiter and heading syntax.

use std::fmt;

use serde::Serialize;

pub const BRACE_OPEN: u8 = b'{';
pub const BRACE_CLOSE: u8 = b'}';
pub const QUOTE: u8 = b'"';
pub const LINE_COMMENT: &[u8] = b"//";

pub const HEADING_MARK: u8 = b'#';
pub const MAX_HEADING_LEVEL: u8 = 6;
/// Section rank of a block header; stronger than every heading level, so
/// headings after a header nest inside it.
pub const HEADER_RANK: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DelimiterKind {
    Brace,
    Quote,
    LineComment,
}

impl DelimiterKind {
    /// No other delimiter is recognized inside an opaque one: inside a quote
    /// only the closing quote is special, inside a comment nothing is.
    pub fn is_opaque(self) -> bool {
        matches!(self, DelimiterKind::Quote | DelimiterKind::LineComment)
    }
}

impl fmt::Display for DelimiterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DelimiterKind::Brace => "brace",
            DelimiterKind::Quote => "quote",
            DelimiterKind::LineComment => "line-comment",
        };
        f.write_str(name)
    }
}

/// A `#`-prefixed heading line.
pub struct Heading;

impl Heading {
    /// Returns the heading level and the byte offset of the title within
    /// `content` (the line with indentation stripped). `#` must be followed
    /// by whitespace or the end of the line; `#word` is a hashtag.
    pub fn parse(content: &str) -> Option<(u8, usize)> {
        let hashes = content.bytes().take_while(|&b| b == HEADING_MARK).count();
        if hashes == 0 || hashes > usize::from(MAX_HEADING_LEVEL) {
            return None;
        }
        let after = &content[hashes..];
        if !(after.is_empty() || after.starts_with(|c: char| c.is_ascii_whitespace())) {
            return None;
        }
        let title = hashes + (after.len() - after.trim_start().len());
        Some((hashes as u8, title))
    }
}
