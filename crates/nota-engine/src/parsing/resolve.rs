//! # Block resolution
//!
//! Turns the scanner's markers into validated [`Region`]s:
//!
//! - delimiter open/close markers pair up; a close matches the nearest open
//!   of the same kind,
//! - a delimiter still open when its indentation block closes is closed at
//!   the block boundary (`UnterminatedSpan`), and one still open at EOF is
//!   closed at the document end,
//! - each section line extends until the next section line with smaller
//!   indentation, or equal indentation and an equal-or-stronger rank, or the
//!   end of its indentation block, or EOF. A block header outranks every
//!   heading, so it runs until the next block header at the same or
//!   shallower indentation and the headings in between nest inside it.
//!
//! Regions come out sorted by start ascending, end descending, then
//! precedence (delimiter before section before indentation). An indentation
//! region identical to a section region is dropped.

use serde::Serialize;

use super::{
    diagnostics::{Diagnostic, DiagnosticKind},
    rope::Span,
    scan::{DelimiterKind, Marker, MarkerKind, Role, SectionHead},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RegionKind {
    Delimiter(DelimiterKind),
    Indent { width: usize },
    Section { rank: u8, head: SectionHead },
}

impl RegionKind {
    /// Tie-break for regions with identical boundaries; lower sorts first.
    pub fn precedence(&self) -> u8 {
        match self {
            RegionKind::Delimiter(_) => 0,
            RegionKind::Section { .. } => 1,
            RegionKind::Indent { .. } => 2,
        }
    }
}

/// A matched, validated region of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub kind: RegionKind,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub regions: Vec<Region>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
enum Open {
    Delimiter { kind: DelimiterKind, start: usize },
    Indent { width: usize, start: usize },
}

#[derive(Debug, Clone, Copy)]
struct SectionLine {
    pos: usize,
    rank: u8,
    width: usize,
    head: SectionHead,
}

/// Resolves markers for a document of `len` bytes.
pub fn resolve(markers: &[Marker], len: usize) -> Resolution {
    let mut out = Resolution::default();
    let mut stack: Vec<Open> = Vec::new();
    let mut indents: Vec<Region> = Vec::new();
    let mut sections: Vec<SectionLine> = Vec::new();

    for marker in markers {
        match (marker.kind, marker.role) {
            (MarkerKind::Delimiter(kind), Role::Open) => {
                stack.push(Open::Delimiter {
                    kind,
                    start: marker.pos,
                });
            }
            (MarkerKind::Delimiter(kind), Role::Close) => {
                let nearest = stack
                    .iter()
                    .rposition(|o| matches!(o, Open::Delimiter { kind: k, .. } if *k == kind));
                match nearest.map(|i| stack.remove(i)) {
                    Some(Open::Delimiter { start, .. }) => {
                        let end = match kind {
                            DelimiterKind::LineComment => marker.pos,
                            DelimiterKind::Brace | DelimiterKind::Quote => marker.pos + 1,
                        };
                        out.regions.push(Region {
                            kind: RegionKind::Delimiter(kind),
                            span: Span::new(start, end),
                        });
                    }
                    _ => out.diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::MismatchedSpan,
                        Span::new(marker.pos, marker.pos + 1),
                        format!("closing {kind} with no matching open"),
                    )),
                }
            }
            (MarkerKind::Indent { width }, Role::Open) => {
                stack.push(Open::Indent {
                    width,
                    start: marker.pos,
                });
            }
            (MarkerKind::Indent { .. }, Role::Close) => {
                while let Some(open) = stack.pop() {
                    match open {
                        Open::Delimiter { kind, start } => {
                            force_close(&mut out, kind, start, marker.pos, "indented block");
                        }
                        Open::Indent { width, start } => {
                            indents.push(Region {
                                kind: RegionKind::Indent { width },
                                span: Span::new(start, marker.pos),
                            });
                            break;
                        }
                    }
                }
            }
            (MarkerKind::Section { rank, width, head }, _) => sections.push(SectionLine {
                pos: marker.pos,
                rank,
                width,
                head,
            }),
            _ => {}
        }
    }

    while let Some(open) = stack.pop() {
        match open {
            Open::Delimiter { kind, start } => force_close(&mut out, kind, start, len, "document"),
            Open::Indent { width, start } => {
                log::warn!("indentation level opened at {start} was never closed");
                indents.push(Region {
                    kind: RegionKind::Indent { width },
                    span: Span::new(start, len),
                });
            }
        }
    }

    let section_regions = section_extents(&sections, &indents, len);
    indents.retain(|ind| !section_regions.iter().any(|s| s.span == ind.span));
    out.regions.extend(section_regions);
    out.regions.extend(indents);
    out.regions.retain(|r| !r.span.is_empty());
    out.regions
        .sort_by_key(|r| (r.span.nesting_key(), r.kind.precedence()));
    out
}

fn force_close(out: &mut Resolution, kind: DelimiterKind, start: usize, end: usize, at: &str) {
    log::trace!("closing {kind} opened at {start} at end of {at} ({end})");
    out.regions.push(Region {
        kind: RegionKind::Delimiter(kind),
        span: Span::new(start, end),
    });
    out.diagnostics.push(Diagnostic::warning(
        DiagnosticKind::UnterminatedSpan,
        Span::new(start, start + 1),
        format!("unclosed {kind}, closed at end of {at}"),
    ));
}

fn section_extents(sections: &[SectionLine], indents: &[Region], len: usize) -> Vec<Region> {
    sections
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let next_section = sections[i + 1..]
                .iter()
                .find(|t| t.width < s.width || (t.width == s.width && t.rank <= s.rank))
                .map(|t| t.pos);
            let block_end = indents
                .iter()
                .filter(|ind| ind.span.start <= s.pos && s.pos < ind.span.end)
                .map(|ind| ind.span.end)
                .min();
            let end = [next_section, block_end]
                .into_iter()
                .flatten()
                .fold(len, usize::min);
            Region {
                kind: RegionKind::Section {
                    rank: s.rank,
                    head: s.head,
                },
                span: Span::new(s.pos, end),
            }
        })
        .collect()
}

/// Number of regions of `kind` that strictly enclose `span`.
pub fn nesting_depth(regions: &[Region], kind: DelimiterKind, span: Span) -> usize {
    regions
        .iter()
        .filter(|r| r.kind == RegionKind::Delimiter(kind))
        .filter(|r| r.span.contains(span) && r.span != span)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::scan::scan;
    use pretty_assertions::assert_eq;
    use xi_rope::Rope;

    fn resolve_str(text: &str) -> Resolution {
        let out = scan(&Rope::from(text));
        resolve(&out.markers, out.len)
    }

    fn kinds_and_spans(res: &Resolution) -> Vec<(String, Span)> {
        res.regions
            .iter()
            .map(|r| {
                let name = match r.kind {
                    RegionKind::Delimiter(k) => k.to_string(),
                    RegionKind::Indent { width } => format!("indent{width}"),
                    RegionKind::Section { rank, .. } => format!("section{rank}"),
                };
                (name, r.span)
            })
            .collect()
    }

    #[test]
    fn nested_braces_around_quote() {
        let text = r#"{ "a" { "b" } }"#;
        let res = resolve_str(text);
        let b = res
            .regions
            .iter()
            .find(|r| r.kind == RegionKind::Delimiter(DelimiterKind::Quote) && r.span.start == 8)
            .expect("quote b");
        assert_eq!(nesting_depth(&res.regions, DelimiterKind::Brace, b.span), 2);
        assert!(res.diagnostics.is_empty());
    }

    #[test]
    fn unterminated_quote_closes_at_document_end() {
        let res = resolve_str("\"abc");
        assert_eq!(
            kinds_and_spans(&res),
            vec![("quote".to_string(), Span::new(0, 4))]
        );
        assert_eq!(res.diagnostics.len(), 1);
        assert_eq!(res.diagnostics[0].kind, DiagnosticKind::UnterminatedSpan);
    }

    #[test]
    fn delimiter_is_force_closed_at_indented_block_end() {
        let res = resolve_str("a\n  {x\nb\n");
        assert_eq!(
            kinds_and_spans(&res),
            vec![
                ("indent2".to_string(), Span::new(2, 7)),
                ("brace".to_string(), Span::new(4, 7)),
            ]
        );
        assert_eq!(res.diagnostics.len(), 1);
        assert_eq!(res.diagnostics[0].kind, DiagnosticKind::UnterminatedSpan);
    }

    #[test]
    fn brace_may_close_inside_deeper_block() {
        let res = resolve_str("{\n  a }\n");
        assert!(res.diagnostics.is_empty());
        assert!(
            res.regions
                .iter()
                .any(|r| r.kind == RegionKind::Delimiter(DelimiterKind::Brace)
                    && r.span == Span::new(0, 7))
        );
    }

    #[test]
    fn sibling_headings_end_at_each_other() {
        let res = resolve_str("# A\none\n# B\ntwo\n");
        assert_eq!(
            kinds_and_spans(&res),
            vec![
                ("section1".to_string(), Span::new(0, 8)),
                ("section1".to_string(), Span::new(8, 16)),
            ]
        );
    }

    #[test]
    fn weaker_heading_nests_inside_stronger() {
        let res = resolve_str("# A\n## B\nx\n# C\n");
        assert_eq!(
            kinds_and_spans(&res),
            vec![
                ("section1".to_string(), Span::new(0, 11)),
                ("section2".to_string(), Span::new(4, 11)),
                ("section1".to_string(), Span::new(11, 15)),
            ]
        );
    }

    #[test]
    fn indented_section_replaces_identical_indent_region() {
        let res = resolve_str("top\n  -- inner\n  body\nback\n");
        assert_eq!(
            kinds_and_spans(&res),
            vec![("section0".to_string(), Span::new(4, 22))]
        );
    }

    #[test]
    fn section_ends_at_enclosing_block_end() {
        let res = resolve_str("  # A\n  x\n    # B\n    y\n  z\n");
        let spans = kinds_and_spans(&res);
        assert!(spans.contains(&("section1".to_string(), Span::new(10, 24))));
    }
}
