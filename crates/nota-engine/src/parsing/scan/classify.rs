use serde::Serialize;

use crate::parsing::rope::Span;

pub const TAB_STOP: usize = 4;

/// Structural role of a non-blank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Text,
    Heading,
    Header,
    Field,
}

impl LineKind {
    /// Heading, header and field lines are never paragraph content.
    pub fn is_structural(self) -> bool {
        !matches!(self, LineKind::Text)
    }
}

/// Facts about one source line, recorded by the scanner for the fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineFacts {
    /// Full line, newline included.
    pub span: Span,
    /// Line content after indentation, line ending excluded.
    pub content: Span,
    /// Indentation width (tabs advance to the next multiple of four).
    pub indent: usize,
    pub blank: bool,
    pub kind: LineKind,
    /// A quote was open when the line started.
    pub in_quote: bool,
}

/// Measures leading indentation, returning its width and byte length.
pub fn measure_indent(text: &str) -> (usize, usize) {
    let mut width = 0;
    let mut bytes = 0;
    for b in text.bytes() {
        match b {
            b' ' => width += 1,
            b'\t' => width = (width / TAB_STOP + 1) * TAB_STOP,
            _ => break,
        }
        bytes += 1;
    }
    (width, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("text", (0, 0))]
    #[case("  text", (2, 2))]
    #[case("\ttext", (4, 1))]
    #[case("  \ttext", (4, 3))]
    #[case("    \t x", (9, 6))]
    #[case("   ", (3, 3))]
    fn indentation_width(#[case] text: &str, #[case] expected: (usize, usize)) {
        assert_eq!(measure_indent(text), expected);
    }
}
