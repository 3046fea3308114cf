use std::sync::OnceLock;

use regex::Regex;

use super::{Candidate, EntityValue, Priority};
use crate::parsing::{
    diagnostics::{Diagnostic, DiagnosticKind},
    rope::Span,
    scan::cursor::Cursor,
};

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

const SCHEMES: [&str; 2] = ["http://", "https://"];

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r#"^https?://[^\s<>"{}]+"#).expect("Invalid URL regex"))
}

/// Length of a bare URL at the start of `text`, trailing sentence
/// punctuation excluded.
fn bare_len(text: &str) -> Option<usize> {
    let m = url_regex().find(text)?;
    let mut end = m.end();
    while let Some(last) = text[..end].chars().last() {
        if matches!(last, '.' | ',' | ':' | ';' | '!' | '?' | ')' | ']' | '}') {
            end -= last.len_utf8();
        } else {
            break;
        }
    }
    let scheme = SCHEMES.iter().find(|s| text.starts_with(**s))?;
    (end > scheme.len()).then_some(end)
}

/// `http://...` up to whitespace, or `<http://...>` up to the closing `>`.
pub fn url(cur: &Cursor<'_>, fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    let rest = cur.rest();
    match rest.strip_prefix('<') {
        Some(inner) => {
            if !SCHEMES.iter().any(|s| inner.starts_with(s)) {
                return None;
            }
            match inner.find('>') {
                Some(close) => {
                    let raw = &inner[..close];
                    let len = close + 2;
                    Some(Candidate::new(
                        Priority::Url,
                        len,
                        EntityValue::Url { raw: raw.to_owned() },
                    ))
                }
                None => {
                    fallback.push(Diagnostic::warning(
                        DiagnosticKind::LexError,
                        Span::new(cur.pos(), cur.pos() + 1),
                        "unclosed `<` before URL, reading it as a bare URL",
                    ));
                    None
                }
            }
        }
        None => {
            let len = bare_len(rest)?;
            Some(Candidate::new(
                Priority::Url,
                len,
                EntityValue::Url {
                    raw: rest[..len].to_owned(),
                },
            ))
        }
    }
}
