//! Hashtags, references and terms.

use super::{Candidate, EntityValue, Priority, is_word};
use crate::parsing::{
    diagnostics::{Diagnostic, DiagnosticKind},
    rope::Span,
    scan::cursor::Cursor,
};

fn is_tag_char(c: char) -> bool {
    is_word(c) || c == '-'
}

/// `#name`: not preceded by a word character or `#`, not followed by `#`.
/// Trailing `-` and `_` are left out of both the name and the span.
pub fn hashtag(cur: &Cursor<'_>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(|c| is_word(c) || c == '#') {
        return None;
    }
    let rest = cur.rest();
    let body = rest.strip_prefix('#')?;
    let run = body
        .char_indices()
        .find(|&(_, c)| !is_tag_char(c))
        .map_or(body.len(), |(i, _)| i);
    if body[run..].starts_with('#') {
        return None;
    }
    let name = body[..run].trim_end_matches(['-', '_']);
    if name.is_empty() {
        return None;
    }
    Some(Candidate::new(
        Priority::Hashtag,
        1 + name.len(),
        EntityValue::Hashtag {
            name: name.to_owned(),
        },
    ))
}

/// `[target]` on a single line with no nested brackets.
pub fn reference(cur: &Cursor<'_>, fallback: &mut Vec<Diagnostic>) -> Option<Candidate> {
    let body = cur.rest().strip_prefix('[')?;
    match body.find(['[', ']']) {
        Some(close) if body[close..].starts_with(']') => {
            let target = body[..close].trim();
            if target.is_empty() {
                return None;
            }
            Some(Candidate::new(
                Priority::Reference,
                close + 2,
                EntityValue::Reference {
                    target: target.to_owned(),
                },
            ))
        }
        _ => {
            fallback.push(Diagnostic::warning(
                DiagnosticKind::LexError,
                Span::new(cur.pos(), cur.pos() + 1),
                "unterminated reference",
            ));
            None
        }
    }
}

/// `_text_` with no `_` inside, not glued to word characters.
pub fn term(cur: &Cursor<'_>) -> Option<Candidate> {
    if cur.prev_char().is_some_and(is_word) {
        return None;
    }
    let body = cur.rest().strip_prefix('_')?;
    let close = body.find('_')?;
    let name = &body[..close];
    if name.trim().is_empty() || name.trim() != name {
        return None;
    }
    if body[close + 1..].chars().next().is_some_and(is_word) {
        return None;
    }
    Some(Candidate::new(
        Priority::Term,
        close + 2,
        EntityValue::Term {
            name: name.to_owned(),
        },
    ))
}
