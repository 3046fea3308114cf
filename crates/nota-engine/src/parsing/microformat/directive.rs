//! `--` directive lines.
//!
//! ```text
//! -- tools/git:bookmark tag=cheatsheet     block header
//! -- status=done owner=me                  field line
//! ---                                      plain text
//! ```
//!
//! A block header's first token has no `=`; it is `name[:type]`, with the
//! type defaulting to [`DEFAULT_BLOCK_TYPE`]. Every other token is
//! `key=value`; a token that isn't is skipped with a warning. Repeated keys
//! keep the later value.

use std::collections::BTreeMap;

use super::EntityValue;
use crate::parsing::{
    diagnostics::{Diagnostic, DiagnosticKind},
    rope::Span,
};

pub const DEFAULT_BLOCK_TYPE: &str = "note";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Header { name: String, block_type: String },
    Fields,
}

/// One `key=value` token, the last occurrence of its key on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldToken {
    pub span: Span,
    pub key: String,
    pub value: String,
}

impl FieldToken {
    pub fn entity_value(&self) -> EntityValue {
        EntityValue::Field {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Source order, one per unique key.
    pub fields: Vec<FieldToken>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Directive {
    pub fn field_map(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.value.clone()))
            .collect()
    }

    /// The block-header entity value, if this is a header line.
    pub fn header_value(&self) -> Option<EntityValue> {
        match &self.kind {
            DirectiveKind::Header { name, block_type } => Some(EntityValue::BlockHeader {
                name: name.clone(),
                block_type: block_type.clone(),
                fields: self.field_map(),
            }),
            DirectiveKind::Fields => None,
        }
    }
}

/// Whitespace-separated tokens with their byte offsets.
fn tokens(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(|c: char| c.is_ascii_whitespace())
        .scan(0, |offset, tok| {
            let at = *offset;
            *offset += tok.len() + 1;
            Some((at, tok))
        })
        .filter(|(_, tok)| !tok.is_empty())
}

/// Parses `content`, the line with its indentation already stripped, whose
/// first byte sits at absolute offset `base`.
pub fn parse_directive(content: &str, base: usize) -> Option<Directive> {
    let body = content.strip_prefix("--")?;
    if !body.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let body_base = base + 2;
    let mut toks = tokens(body).peekable();
    let (_, first) = *toks.peek()?;

    let kind = if first.contains('=') {
        DirectiveKind::Fields
    } else {
        toks.next();
        let (name, block_type) = match first.split_once(':') {
            Some((name, ty)) if !ty.is_empty() => (name, ty),
            Some((name, _)) => (name, DEFAULT_BLOCK_TYPE),
            None => (first, DEFAULT_BLOCK_TYPE),
        };
        if name.is_empty() {
            return None;
        }
        DirectiveKind::Header {
            name: name.to_owned(),
            block_type: block_type.to_owned(),
        }
    };

    let mut diagnostics = Vec::new();
    let mut fields: Vec<FieldToken> = Vec::new();
    for (at, tok) in toks {
        let span = Span::new(body_base + at, body_base + at + tok.len());
        match tok.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                fields.retain(|f| f.key != key);
                fields.push(FieldToken {
                    span,
                    key: key.to_owned(),
                    value: value.to_owned(),
                });
            }
            _ => diagnostics.push(Diagnostic::warning(
                DiagnosticKind::LexError,
                span,
                format!("expected key=value, found `{tok}`"),
            )),
        }
    }

    if kind == DirectiveKind::Fields && fields.is_empty() {
        return None;
    }
    Some(Directive {
        kind,
        fields,
        diagnostics,
    })
}
