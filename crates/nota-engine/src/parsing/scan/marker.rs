use serde::Serialize;

use super::kinds::DelimiterKind;
use crate::parsing::{microformat::EntityId, rope::Span};

/// What opens a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionHead {
    /// `#`-prefixed heading line; `title` excludes the hashes.
    Heading { level: u8, title: Span },
    /// `--` block-header line, decoded as the given entity.
    Header { entity: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerKind {
    Delimiter(DelimiterKind),
    Indent {
        width: usize,
    },
    /// A heading or block-header line. `rank` orders section strength
    /// (block header 0, heading level 1-6); `width` is the line's indentation.
    Section {
        rank: u8,
        width: usize,
        head: SectionHead,
    },
    Microformat(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Open,
    Close,
    Point,
}

/// A tagged position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub pos: usize,
    pub kind: MarkerKind,
    pub role: Role,
}

impl Marker {
    pub fn open(pos: usize, kind: MarkerKind) -> Self {
        Self {
            pos,
            kind,
            role: Role::Open,
        }
    }

    pub fn close(pos: usize, kind: MarkerKind) -> Self {
        Self {
            pos,
            kind,
            role: Role::Close,
        }
    }

    pub fn point(pos: usize, kind: MarkerKind) -> Self {
        Self {
            pos,
            kind,
            role: Role::Point,
        }
    }
}
