//! # Microformats
//!
//! Decoding of the small lexical conventions that carry metadata inside free
//! text. The scanner asks [`recognize_at`] at every scan position; each
//! recognizer here turns a matched lexeme into a typed [`EntityValue`] and
//! reports validation problems as diagnostics.
//!
//! ## Priority
//!
//! Overlapping candidates are resolved by a fixed priority, first match wins
//! and ties within one priority go to the longest match:
//!
//! ```text
//! datetime > date > time > URL > block-header-line > field-line
//!          > reference > hashtag > term
//! ```
//!
//! Block-header and field lines are line-level directives ([`directive`]);
//! the scanner checks them at the start of each line's content, where none of
//! the higher-priority inline recognizers can match (they never start with
//! `-`).
//!
//! Two candidates with the same priority and the same length are reported as
//! an [`AmbiguousMarker`](crate::parsing::diagnostics::DiagnosticKind) and the
//! text stays plain.

pub mod datetime;
pub mod directive;
pub mod inline;
pub mod url;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

pub use datetime::{Date, Time};

use super::{diagnostics::Diagnostic, rope::Span, scan::cursor::Cursor};

/// Index of an entity inside its [`Tree`](crate::parsing::tree::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub usize);

/// A decoded microformat occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub span: Span,
    pub value: EntityValue,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.value.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityValue {
    Hashtag {
        name: String,
    },
    Reference {
        target: String,
    },
    Term {
        name: String,
    },
    Date(Date),
    Time(Time),
    Datetime {
        date: Date,
        time: Time,
    },
    Url {
        raw: String,
    },
    Field {
        key: String,
        value: String,
    },
    BlockHeader {
        name: String,
        block_type: String,
        fields: BTreeMap<String, String>,
    },
}

impl EntityValue {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityValue::Hashtag { .. } => EntityKind::Hashtag,
            EntityValue::Reference { .. } => EntityKind::Reference,
            EntityValue::Term { .. } => EntityKind::Term,
            EntityValue::Date(_) => EntityKind::Date,
            EntityValue::Time(_) => EntityKind::Time,
            EntityValue::Datetime { .. } => EntityKind::Datetime,
            EntityValue::Url { .. } => EntityKind::Url,
            EntityValue::Field { .. } => EntityKind::Field,
            EntityValue::BlockHeader { .. } => EntityKind::BlockHeader,
        }
    }
}

/// Canonical textual rendering of a decoded value.
impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Hashtag { name } => write!(f, "#{name}"),
            EntityValue::Reference { target } => write!(f, "[{target}]"),
            EntityValue::Term { name } => write!(f, "_{name}_"),
            EntityValue::Date(date) => write!(f, "{date}"),
            EntityValue::Time(time) => write!(f, "{time}"),
            EntityValue::Datetime { date, time } => write!(f, "{date}T{time}"),
            EntityValue::Url { raw } => f.write_str(raw),
            EntityValue::Field { key, value } => write!(f, "{key}={value}"),
            EntityValue::BlockHeader {
                name,
                block_type,
                fields,
            } => {
                write!(f, "-- {name}:{block_type}")?;
                for (key, value) in fields {
                    write!(f, " {key}={value}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Hashtag,
    Reference,
    Term,
    Date,
    Time,
    Datetime,
    Url,
    Field,
    BlockHeader,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Hashtag => "hashtag",
            EntityKind::Reference => "reference",
            EntityKind::Term => "term",
            EntityKind::Date => "date",
            EntityKind::Time => "time",
            EntityKind::Datetime => "datetime",
            EntityKind::Url => "url",
            EntityKind::Field => "field",
            EntityKind::BlockHeader => "block_header",
        };
        f.write_str(name)
    }
}

/// Inline recognizer priority; lower sorts first and wins. Directive lines
/// sit between `Url` and `Reference` but are decided per line before any
/// inline recognizer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Datetime,
    Date,
    Time,
    Url,
    Reference,
    Hashtag,
    Term,
}

/// A successful match from one recognizer, relative to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub priority: Priority,
    /// Matched length in bytes from the cursor position.
    pub len: usize,
    pub value: EntityValue,
    /// Validation warnings that only apply if this candidate wins.
    pub diagnostics: Vec<Diagnostic>,
}

impl Candidate {
    pub fn new(priority: Priority, len: usize, value: EntityValue) -> Self {
        Self {
            priority,
            len,
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

/// Result of arbitrating between candidates at one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Nothing,
    One(Candidate),
    /// More than one candidate of the winning priority had the longest
    /// length. Carries that priority and length.
    Ambiguous(Priority, usize),
}

/// Everything the recognizers found at one position.
#[derive(Debug, Default)]
pub struct Recognized {
    pub candidates: Vec<Candidate>,
    /// Fallback diagnostics: recognizers that rejected a malformed lexeme.
    /// Only reported when no candidate wins at this position.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs every inline recognizer that can start at the cursor's current byte.
pub fn recognize_at(cur: &Cursor<'_>) -> Recognized {
    let mut diagnostics = Vec::new();
    let found: Vec<Option<Candidate>> = match cur.peek() {
        Some(b'0'..=b'9') => vec![
            datetime::datetime(cur, &mut diagnostics),
            datetime::date(cur, &mut diagnostics),
            datetime::clock_time(cur, &mut diagnostics),
            datetime::meridiem_time(cur, &mut diagnostics),
        ],
        Some(b'h') | Some(b'<') => vec![url::url(cur, &mut diagnostics)],
        Some(b'[') => vec![inline::reference(cur, &mut diagnostics)],
        Some(b'#') => vec![inline::hashtag(cur)],
        Some(b'_') => vec![inline::term(cur)],
        _ => Vec::new(),
    };
    Recognized {
        candidates: found.into_iter().flatten().collect(),
        diagnostics,
    }
}

/// Picks the winner: best priority first, then longest match.
pub fn pick(candidates: Vec<Candidate>) -> Pick {
    let Some(best) = candidates.iter().map(|c| c.priority).min() else {
        return Pick::Nothing;
    };
    let mut top: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.priority == best)
        .collect();
    let longest = top.iter().map(|c| c.len).max().unwrap_or(0);
    top.retain(|c| c.len == longest);
    match top.len() {
        1 => top.pop().map_or(Pick::Nothing, Pick::One),
        _ => Pick::Ambiguous(best, longest),
    }
}

/// Word characters for boundary checks: letters, digits and `_`.
pub(crate) fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
