//! # Query facade
//!
//! Read-only operations over a set of parsed notes, keyed by document id.
//! [`NoteIndex`] only borrows the notes; every call recomputes its answer
//! from the trees, so results never go stale and repeated calls return
//! identical results.
//!
//! Operations that span documents take an optional scope: a document-id
//! prefix (`tools/` matches `tools/git` and `tools/jq`).

pub mod keywords;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::parsing::{
    EntityKind, EntityValue, NodeId, NodeKind, ParsedNote, Span,
    rope::one_line_preview,
};

pub use keywords::{KeywordEntry, KeywordIndex, KeywordMatch};

const EXCERPT_CHARS: usize = 80;
const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown document: {0}")]
    UnknownDocument(String),
}

/// A Block inside one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRef<'a> {
    pub document: &'a str,
    pub node: NodeId,
    /// Names (or `#index` for unnamed blocks) from the top-level block down.
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermMatches<'a> {
    pub blocks: Vec<BlockRef<'a>>,
    /// Occurrences per document; documents without any are absent.
    pub counts: BTreeMap<&'a str, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit<'a> {
    pub document: &'a str,
    pub path: String,
    pub excerpt: String,
    pub node: NodeId,
    /// First match inside the node.
    pub span: Span,
}

pub struct NoteIndex<'a> {
    notes: BTreeMap<&'a str, &'a ParsedNote>,
}

impl<'a> NoteIndex<'a> {
    pub fn new(notes: impl IntoIterator<Item = (&'a str, &'a ParsedNote)>) -> Self {
        Self {
            notes: notes.into_iter().collect(),
        }
    }

    pub fn from_map(notes: &'a BTreeMap<String, ParsedNote>) -> Self {
        Self::new(notes.iter().map(|(id, note)| (id.as_str(), note)))
    }

    pub fn documents(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.notes.keys().copied()
    }

    pub fn get(&self, document: &str) -> Option<&'a ParsedNote> {
        self.notes.get(document).copied()
    }

    fn scoped(&self, scope: Option<&str>) -> impl Iterator<Item = (&'a str, &'a ParsedNote)> {
        self.notes
            .iter()
            .filter(move |(id, _)| scope.is_none_or(|prefix| id.starts_with(prefix)))
            .map(|(id, note)| (*id, *note))
    }

    /// Top-level Blocks of one document, in source order.
    pub fn top_level_blocks(&self, document: &str) -> Result<Vec<BlockRef<'a>>, QueryError> {
        let (&id, &note) = self
            .notes
            .get_key_value(document)
            .ok_or_else(|| QueryError::UnknownDocument(document.to_owned()))?;
        Ok(note
            .tree
            .top_level_blocks()
            .into_iter()
            .map(|b| block_ref(id, note, b))
            .collect())
    }

    /// Innermost Blocks enclosing a `#name` hashtag. A leading `#` on
    /// `name` is ignored.
    pub fn blocks_with_hashtag(&self, name: &str, scope: Option<&str>) -> Vec<BlockRef<'a>> {
        let name = name.strip_prefix('#').unwrap_or(name);
        let mut out = Vec::new();
        for (id, note) in self.scoped(scope) {
            let matching = note.tree.entities_with_ids().filter(|(_, e)| {
                matches!(&e.value, EntityValue::Hashtag { name: n } if n == name)
            });
            out.extend(enclosing_blocks(id, note, matching.map(|(eid, _)| eid)));
        }
        out
    }

    /// Innermost Blocks enclosing a `_name_` term, with per-document
    /// occurrence counts.
    pub fn blocks_with_term(&self, name: &str, scope: Option<&str>) -> TermMatches<'a> {
        let mut blocks = Vec::new();
        let mut counts = BTreeMap::new();
        for (id, note) in self.scoped(scope) {
            let matching: Vec<_> = note
                .tree
                .entities_with_ids()
                .filter(|(_, e)| matches!(&e.value, EntityValue::Term { name: n } if n == name))
                .map(|(eid, _)| eid)
                .collect();
            if matching.is_empty() {
                continue;
            }
            counts.insert(id, matching.len());
            blocks.extend(enclosing_blocks(id, note, matching));
        }
        TermMatches { blocks, counts }
    }

    /// Case-insensitive substring search over note text. Yields one hit per
    /// innermost node containing a match, in document then source order.
    /// Case folding is Unicode lowercasing, so `É` matches `é`.
    pub fn search(&self, query: &str, scope: Option<&str>) -> Vec<SearchHit<'a>> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        let mut hits = Vec::new();
        for (id, note) in self.scoped(scope) {
            let haystack = LowerText::new(&note.text(Span::new(0, note.source.len())));
            let mut seen = BTreeSet::new();
            for (start, _) in haystack.text.match_indices(&needle) {
                let span = haystack.source_span(start, needle.len());
                let node = innermost_node(note, span);
                if !seen.insert(node) {
                    continue;
                }
                let path = note
                    .tree
                    .innermost_block(node)
                    .map(|b| block_path(note, b))
                    .unwrap_or_default();
                hits.push(SearchHit {
                    document: id,
                    path,
                    excerpt: excerpt(note, span),
                    node,
                    span,
                });
            }
        }
        hits
    }

    /// Graded keyword lookup over the scoped notes' words.
    pub fn find(&self, query: &str, scope: Option<&str>) -> Vec<KeywordMatch> {
        let mut index = KeywordIndex::new();
        for (id, note) in self.scoped(scope) {
            index.add(id, &note.text(Span::new(0, note.source.len())));
        }
        index.find(query)
    }

    /// Every entity of `kind` across the scoped notes, with its owner block.
    pub fn entities_of_kind(
        &self,
        kind: EntityKind,
        scope: Option<&str>,
    ) -> Vec<(BlockRef<'a>, &'a EntityValue)> {
        let mut out = Vec::new();
        for (id, note) in self.scoped(scope) {
            for (eid, entity) in note.tree.entities_with_ids() {
                if entity.kind() != kind {
                    continue;
                }
                if let Some(block) = note.tree.innermost_block(note.tree.owner(eid)) {
                    out.push((block_ref(id, note, block), &entity.value));
                }
            }
        }
        out
    }
}

fn block_ref<'a>(document: &'a str, note: &ParsedNote, node: NodeId) -> BlockRef<'a> {
    BlockRef {
        document,
        node,
        path: block_path(note, node),
        span: note.tree.node(node).span,
    }
}

/// Innermost Blocks for the given entities, deduplicated, first-seen order.
fn enclosing_blocks<'a>(
    document: &'a str,
    note: &ParsedNote,
    entities: impl IntoIterator<Item = crate::parsing::EntityId>,
) -> Vec<BlockRef<'a>> {
    let mut seen = BTreeSet::new();
    entities
        .into_iter()
        .filter_map(|e| note.tree.innermost_block(note.tree.owner(e)))
        .filter(|b| seen.insert(*b))
        .map(|b| block_ref(document, note, b))
        .collect()
}

/// Lowercased text that remembers, for every byte, the source character it
/// came from. Lowercasing may change byte lengths (`İ` becomes two chars).
struct LowerText {
    text: String,
    /// Source span of the character each byte of `text` was produced by.
    origin: Vec<Span>,
}

impl LowerText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut origin = Vec::with_capacity(source.len());
        for (at, c) in source.char_indices() {
            let from = Span::new(at, at + c.len_utf8());
            for lower in c.to_lowercase() {
                text.push(lower);
                origin.extend(std::iter::repeat_n(from, lower.len_utf8()));
            }
        }
        Self { text, origin }
    }

    /// Source span covering `len` lowered bytes from `start`; `len > 0`.
    fn source_span(&self, start: usize, len: usize) -> Span {
        Span::new(self.origin[start].start, self.origin[start + len - 1].end)
    }
}

fn innermost_node(note: &ParsedNote, span: Span) -> NodeId {
    let tree = &note.tree;
    let mut at = tree.root();
    while let Some(&next) = tree
        .node(at)
        .children
        .iter()
        .find(|&&c| tree.node(c).span.contains(span))
    {
        at = next;
    }
    at
}

fn block_path(note: &ParsedNote, block: NodeId) -> String {
    let tree = &note.tree;
    let mut segments: Vec<String> = std::iter::once(block)
        .chain(tree.ancestors(block))
        .filter(|&n| tree.node(n).kind == NodeKind::Block)
        .map(|n| {
            let node = tree.node(n);
            match &node.name {
                Some(name) => name.clone(),
                None => {
                    let index = node
                        .parent
                        .map(|p| {
                            tree.node(p)
                                .children
                                .iter()
                                .filter(|&&c| tree.node(c).kind == NodeKind::Block)
                                .position(|&c| c == n)
                                .unwrap_or(0)
                        })
                        .unwrap_or(0);
                    format!("#{index}")
                }
            }
        })
        .collect();
    segments.reverse();
    segments.join(PATH_SEPARATOR)
}

/// The source line holding `span`, folded onto one line.
fn excerpt(note: &ParsedNote, span: Span) -> String {
    let text = note.text(Span::new(0, note.source.len()));
    let start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let end = text[span.end..]
        .find('\n')
        .map_or(text.len(), |i| span.end + i);
    one_line_preview(&note.source, Span::new(start, end), EXCERPT_CHARS)
}
