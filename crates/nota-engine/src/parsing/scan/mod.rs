//! # Marker scanning
//!
//! One left-to-right pass over the rope, line by line, producing:
//!
//! - position-ordered [`Marker`]s (delimiter open/close, indentation
//!   changes, section lines, microformat points),
//! - the decoded microformat [`Entity`] list, in source order,
//! - per-line [`LineFacts`] for the paragraph fold,
//! - recoverable diagnostics.
//!
//! ## Indentation
//!
//! The scanner keeps a stack of indentation widths. A non-blank line deeper
//! than the top opens a level at the line start; a shallower line closes
//! levels at the end of the last non-blank line (newline included). A line
//! that lands between two levels closes the deeper one and opens its own.
//! Blank lines never change indentation.
//!
//! ## Delimiters
//!
//! ```text
//! { ... }        brace, nests
//! " ... "        quote, may span lines, opaque
//! // ...         line comment, at line start or after whitespace, opaque
//! ```
//!
//! Delimiters opened at a deeper indentation are dropped from the scanner
//! state when their level closes; the resolver reports them. Delimiters
//! still open at EOF are likewise left for the resolver.

pub mod classify;
pub mod cursor;
pub mod kinds;
pub mod marker;

use xi_rope::Rope;

pub use classify::{LineFacts, LineKind, measure_indent};
pub use kinds::DelimiterKind;
pub use marker::{Marker, MarkerKind, Role, SectionHead};

use cursor::Cursor;
use kinds::{BRACE_CLOSE, BRACE_OPEN, HEADER_RANK, Heading, LINE_COMMENT, QUOTE};

use super::{
    diagnostics::{Diagnostic, DiagnosticKind},
    microformat::{
        self, Entity, EntityId, EntityValue, Pick,
        directive::{DirectiveKind, parse_directive},
    },
    rope::{LineRef, Span, lines_with_spans},
};

/// Everything the scanner produces for one document.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub markers: Vec<Marker>,
    pub entities: Vec<Entity>,
    pub lines: Vec<LineFacts>,
    pub diagnostics: Vec<Diagnostic>,
    /// Byte length of the scanned text.
    pub len: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenDelimiter {
    kind: DelimiterKind,
    /// Indentation depth (stack length) when opened.
    depth: usize,
}

/// Scans a whole document.
pub fn scan(rope: &Rope) -> ScanOutput {
    let mut scanner = Scanner::new(rope.len());
    for lr in lines_with_spans(rope) {
        scanner.push_line(&lr);
    }
    scanner.finish()
}

pub struct Scanner {
    indents: Vec<usize>,
    delimiters: Vec<OpenDelimiter>,
    /// End of the last non-blank line, newline included.
    last_line_end: usize,
    out: ScanOutput,
}

impl Scanner {
    pub fn new(len: usize) -> Self {
        Self {
            indents: Vec::new(),
            delimiters: Vec::new(),
            last_line_end: 0,
            out: ScanOutput {
                len,
                ..ScanOutput::default()
            },
        }
    }

    pub fn push_line(&mut self, lr: &LineRef) {
        let content = lr.content();
        let base = lr.span.start;
        let content_end = lr.content_end();
        let (indent, idx) = measure_indent(content);
        let body = &content[idx..];

        if body.trim().is_empty() {
            let in_quote = self.in_quote();
            self.out.lines.push(LineFacts {
                span: lr.span,
                content: Span::new(base + idx, content_end),
                indent,
                blank: true,
                kind: LineKind::Text,
                in_quote,
            });
            return;
        }

        self.set_indent(indent, base);
        let in_quote = self.in_quote();

        let kind = if in_quote {
            self.scan_inline(content, base, idx);
            LineKind::Text
        } else if let Some((level, title)) = Heading::parse(body) {
            let title_span = Span::new(base + idx + title, content_end);
            self.out.markers.push(Marker::point(
                base,
                MarkerKind::Section {
                    rank: level,
                    width: indent,
                    head: SectionHead::Heading {
                        level,
                        title: title_span,
                    },
                },
            ));
            self.scan_inline(content, base, idx + title);
            LineKind::Heading
        } else if let Some(directive) = parse_directive(body, base + idx) {
            let line_kind = match directive.header_value() {
                Some(value) => {
                    let entity = EntityId(self.out.entities.len());
                    self.out.markers.push(Marker::point(
                        base,
                        MarkerKind::Section {
                            rank: HEADER_RANK,
                            width: indent,
                            head: SectionHead::Header { entity },
                        },
                    ));
                    let end = base + idx + body.trim_end().len();
                    self.push_entity(Span::new(base + idx, end), value);
                    LineKind::Header
                }
                None => {
                    debug_assert!(directive.kind == DirectiveKind::Fields);
                    LineKind::Field
                }
            };
            for field in &directive.fields {
                self.push_entity(field.span, field.entity_value());
            }
            self.out.diagnostics.extend(directive.diagnostics);
            line_kind
        } else {
            self.scan_inline(content, base, idx);
            LineKind::Text
        };

        if self.top_kind() == Some(DelimiterKind::LineComment) {
            self.delimiters.pop();
            self.out.markers.push(Marker::close(
                content_end,
                MarkerKind::Delimiter(DelimiterKind::LineComment),
            ));
        }

        self.out.lines.push(LineFacts {
            span: lr.span,
            content: Span::new(base + idx, content_end),
            indent,
            blank: false,
            kind,
            in_quote,
        });
        self.last_line_end = lr.span.end;
    }

    pub fn finish(mut self) -> ScanOutput {
        while let Some(width) = self.indents.pop() {
            self.out.markers.push(Marker::close(
                self.last_line_end,
                MarkerKind::Indent { width },
            ));
        }
        if !self.delimiters.is_empty() {
            log::trace!(
                "{} delimiter(s) still open at end of input",
                self.delimiters.len()
            );
        }
        debug_assert!(
            self.out.markers.windows(2).all(|w| w[0].pos <= w[1].pos),
            "markers out of order"
        );
        self.out
    }

    fn top_kind(&self) -> Option<DelimiterKind> {
        self.delimiters.last().map(|d| d.kind)
    }

    fn in_quote(&self) -> bool {
        self.top_kind() == Some(DelimiterKind::Quote)
    }

    fn set_indent(&mut self, width: usize, line_start: usize) {
        let mut closed = false;
        while let Some(&top) = self.indents.last() {
            if top <= width {
                break;
            }
            self.indents.pop();
            self.out.markers.push(Marker::close(
                self.last_line_end,
                MarkerKind::Indent { width: top },
            ));
            closed = true;
        }
        if closed {
            let depth = self.indents.len();
            let before = self.delimiters.len();
            self.delimiters.retain(|d| d.depth <= depth);
            if self.delimiters.len() < before {
                log::trace!(
                    "dropped {} delimiter(s) at indentation close",
                    before - self.delimiters.len()
                );
            }
        }
        if width > self.indents.last().copied().unwrap_or(0) {
            self.indents.push(width);
            self.out
                .markers
                .push(Marker::open(line_start, MarkerKind::Indent { width }));
        }
    }

    fn open_delimiter(&mut self, kind: DelimiterKind, pos: usize) {
        self.delimiters.push(OpenDelimiter {
            kind,
            depth: self.indents.len(),
        });
        self.out
            .markers
            .push(Marker::open(pos, MarkerKind::Delimiter(kind)));
    }

    fn close_delimiter(&mut self, kind: DelimiterKind, pos: usize) {
        if self.top_kind() == Some(kind) {
            self.delimiters.pop();
            self.out
                .markers
                .push(Marker::close(pos, MarkerKind::Delimiter(kind)));
        } else {
            self.out.diagnostics.push(Diagnostic::warning(
                DiagnosticKind::MismatchedSpan,
                Span::new(pos, pos + 1),
                format!("closing {kind} with no matching open"),
            ));
        }
    }

    fn scan_inline(&mut self, content: &str, base: usize, from: usize) {
        let mut cur = Cursor::new(content, base, from);
        while !cur.eof() {
            let opaque = self.top_kind().filter(|k| k.is_opaque());
            let pos = cur.pos();
            match (opaque, cur.peek()) {
                (Some(DelimiterKind::LineComment), _) => {}
                (Some(DelimiterKind::Quote), Some(QUOTE)) => {
                    self.close_delimiter(DelimiterKind::Quote, pos);
                    cur.bump_n(1);
                    continue;
                }
                (Some(_), _) => {}
                (None, Some(BRACE_OPEN)) => {
                    self.open_delimiter(DelimiterKind::Brace, pos);
                    cur.bump_n(1);
                    continue;
                }
                (None, Some(BRACE_CLOSE)) => {
                    self.close_delimiter(DelimiterKind::Brace, pos);
                    cur.bump_n(1);
                    continue;
                }
                (None, Some(QUOTE)) => {
                    self.open_delimiter(DelimiterKind::Quote, pos);
                    cur.bump_n(1);
                    continue;
                }
                (None, Some(b'/'))
                    if cur.starts_with(LINE_COMMENT)
                        && cur.prev_char().is_none_or(char::is_whitespace) =>
                {
                    self.open_delimiter(DelimiterKind::LineComment, pos);
                    cur.bump_n(LINE_COMMENT.len());
                    continue;
                }
                (None, _) => {}
            }
            match self.microformat_at(&cur, opaque) {
                Some(len) => cur.bump_n(len),
                None => {
                    cur.bump_char();
                }
            }
        }
    }

    /// Recognizes a microformat at the cursor, returning its length.
    fn microformat_at(&mut self, cur: &Cursor<'_>, opaque: Option<DelimiterKind>) -> Option<usize> {
        let found = microformat::recognize_at(cur);
        let rest = cur.rest();
        let candidates = found
            .candidates
            .into_iter()
            .filter(|c| !claims_delimiter(&rest[..c.len], opaque))
            .collect();
        let pos = cur.pos();
        match microformat::pick(candidates) {
            Pick::One(candidate) => {
                self.push_entity(Span::new(pos, pos + candidate.len), candidate.value);
                self.out.diagnostics.extend(candidate.diagnostics);
                Some(candidate.len)
            }
            Pick::Ambiguous(priority, len) => {
                self.out.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::AmbiguousMarker,
                    Span::new(pos, pos + len),
                    format!("more than one {priority:?} reading of `{}`", &rest[..len]),
                ));
                None
            }
            Pick::Nothing => {
                self.out.diagnostics.extend(found.diagnostics);
                None
            }
        }
    }

    fn push_entity(&mut self, span: Span, value: EntityValue) {
        let id = EntityId(self.out.entities.len());
        self.out.entities.push(Entity { span, value });
        self.out
            .markers
            .push(Marker::point(span.start, MarkerKind::Microformat(id)));
    }
}

/// A lexeme may not swallow a character that is a live delimiter in the
/// current context.
fn claims_delimiter(lexeme: &str, opaque: Option<DelimiterKind>) -> bool {
    match opaque {
        Some(DelimiterKind::LineComment) => false,
        Some(_) => lexeme.contains('"'),
        None => lexeme.contains(['"', '{', '}']),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_str(text: &str) -> ScanOutput {
        scan(&Rope::from(text))
    }

    fn delimiter_markers(out: &ScanOutput) -> Vec<(usize, DelimiterKind, Role)> {
        out.markers
            .iter()
            .filter_map(|m| match m.kind {
                MarkerKind::Delimiter(k) => Some((m.pos, k, m.role)),
                _ => None,
            })
            .collect()
    }

    fn indent_markers(out: &ScanOutput) -> Vec<(usize, usize, Role)> {
        out.markers
            .iter()
            .filter_map(|m| match m.kind {
                MarkerKind::Indent { width } => Some((m.pos, width, m.role)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn braces_and_quotes_nest() {
        let out = scan_str(r#"{ "a" }"#);
        use DelimiterKind::*;
        assert_eq!(
            delimiter_markers(&out),
            vec![
                (0, Brace, Role::Open),
                (2, Quote, Role::Open),
                (4, Quote, Role::Close),
                (6, Brace, Role::Close),
            ]
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn indentation_opens_and_closes_levels() {
        let out = scan_str("a\n  b\n\nc\n");
        assert_eq!(
            indent_markers(&out),
            vec![(2, 2, Role::Open), (6, 2, Role::Close)]
        );
    }

    #[test]
    fn dedent_between_levels_opens_new_level() {
        let out = scan_str("a\n    b\n  c\n");
        assert_eq!(
            indent_markers(&out),
            vec![
                (2, 4, Role::Open),
                (8, 4, Role::Close),
                (8, 2, Role::Open),
                (12, 2, Role::Close),
            ]
        );
    }

    #[test]
    fn stray_closer_is_mismatched_and_discarded() {
        let out = scan_str("x }");
        assert!(delimiter_markers(&out).is_empty());
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MismatchedSpan);
    }

    #[test]
    fn line_comment_is_opaque_but_keeps_microformats() {
        let out = scan_str("a // #tag {\nb");
        use DelimiterKind::*;
        assert_eq!(
            delimiter_markers(&out),
            vec![(2, LineComment, Role::Open), (11, LineComment, Role::Close)]
        );
        assert_eq!(out.entities.len(), 1);
        assert_eq!(out.entities[0].value.to_string(), "#tag");
    }

    #[test]
    fn slashes_inside_words_are_not_comments() {
        let out = scan_str("see http://x/y");
        assert!(delimiter_markers(&out).is_empty());
        assert_eq!(out.entities[0].value.to_string(), "http://x/y");
    }

    #[test]
    fn deeper_delimiters_are_dropped_at_dedent() {
        let out = scan_str("a\n  \"open\nb\n");
        assert_eq!(out.lines.len(), 3);
        assert!(!out.lines[2].in_quote);
        assert_eq!(out.lines[2].kind, LineKind::Text);
    }

    #[test]
    fn quoted_lines_are_not_classified() {
        let out = scan_str("\"start\n# not a heading\n\"\n");
        assert!(out.lines[1].in_quote);
        assert_eq!(out.lines[1].kind, LineKind::Text);
        assert!(
            !out.markers
                .iter()
                .any(|m| matches!(m.kind, MarkerKind::Section { .. }))
        );
    }

    #[test]
    fn microformats_cannot_swallow_a_closing_quote() {
        let out = scan_str(r#""a _b" c_"#);
        assert!(out.entities.is_empty());
        assert_eq!(delimiter_markers(&out).len(), 2);
    }

    #[test]
    fn heading_emits_section_marker() {
        let out = scan_str("# Title #work\n");
        let section = out
            .markers
            .iter()
            .find(|m| matches!(m.kind, MarkerKind::Section { .. }))
            .expect("section marker");
        assert_eq!(section.pos, 0);
        assert_eq!(
            section.kind,
            MarkerKind::Section {
                rank: 1,
                width: 0,
                head: SectionHead::Heading {
                    level: 1,
                    title: Span::new(2, 13)
                }
            }
        );
        assert_eq!(out.lines[0].kind, LineKind::Heading);
        assert_eq!(out.entities[0].value.to_string(), "#work");
    }

    #[test]
    fn block_header_line_yields_header_and_field_entities() {
        let out = scan_str("-- tools/git:bookmark tag=cheatsheet\n");
        assert_eq!(out.lines[0].kind, LineKind::Header);
        let values: Vec<String> = out.entities.iter().map(|e| e.value.to_string()).collect();
        assert_eq!(
            values,
            vec![
                "-- tools/git:bookmark tag=cheatsheet".to_string(),
                "tag=cheatsheet".to_string()
            ]
        );
        assert_eq!(out.entities[0].span, Span::new(0, 36));
    }

    #[test]
    fn markers_are_position_ordered() {
        let out = scan_str("# A\n  {x \"y\n  z\" #t}\nb } 10:00\n\t\"open\n");
        assert!(out.markers.windows(2).all(|w| w[0].pos <= w[1].pos));
    }
}
