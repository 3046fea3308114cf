//! # Note parsing
//!
//! Turns free-form note text into a [`Tree`] without a formal grammar.
//!
//! ```text
//! Rope ──scan──▶ markers, entities, line facts
//!        (microformat recognizers run inside the scan)
//!      ──resolve──▶ validated regions
//!      ──fold──▶ Document ▸ Block ▸ Paragraph tree, entities attached
//! ```
//!
//! No stage fails: every malformed construct is recovered and reported as a
//! [`Diagnostic`], so a note that fails to parse perfectly stays viewable and
//! searchable. Parsing is deterministic; re-parsing replaces the tree.

pub mod diagnostics;
pub mod fold;
pub mod microformat;
pub mod resolve;
pub mod rope;
pub mod scan;
pub mod snapshot;
pub mod tree;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use xi_rope::Rope;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use microformat::{Date, Entity, EntityId, EntityKind, EntityValue, Time};
pub use resolve::{Region, RegionKind};
pub use rope::Span;
pub use scan::DelimiterKind;
pub use tree::{BlockOrigin, Node, NodeId, NodeKind, Tree};

/// The result of parsing one note.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedNote {
    /// Document identifier, when the caller gave one.
    pub id: Option<String>,
    #[serde(skip)]
    pub source: Rope,
    pub tree: Tree,
    /// Validated delimiter, indentation and section regions, sorted.
    pub regions: Vec<Region>,
    /// Sorted by position.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedNote {
    pub fn text(&self, span: Span) -> String {
        rope::slice_to_string(&self.source, span)
    }

    pub fn outline(&self) -> String {
        self.tree.outline(&self.source)
    }

    /// See [`Tree::fragments`].
    pub fn fragments(&self, id: NodeId) -> Vec<String> {
        self.tree
            .fragments(&self.source, id)
            .into_iter()
            .map(|(_, text)| text)
            .collect()
    }

    /// Number of `kind` regions strictly enclosing `span`.
    pub fn delimiter_depth(&self, kind: DelimiterKind, span: Span) -> usize {
        resolve::nesting_depth(&self.regions, kind, span)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Parses one note. `id` is only used to label diagnostics.
pub fn parse_document(rope: &Rope, id: Option<&str>) -> ParsedNote {
    let scanned = scan::scan(rope);
    let resolution = resolve::resolve(&scanned.markers, scanned.len);

    let mut diagnostics: Vec<Diagnostic> = scanned
        .diagnostics
        .into_iter()
        .chain(resolution.diagnostics)
        .map(|d| d.with_document(id))
        .collect();
    diagnostics.sort_by_key(|d| d.position());

    let tree = fold::fold(rope, &scanned.lines, scanned.entities, &resolution.regions);
    log::debug!(
        "parsed {}: {} markers, {} regions, {} nodes, {} entities, {} diagnostics",
        id.unwrap_or("<anonymous>"),
        scanned.markers.len(),
        resolution.regions.len(),
        tree.len(),
        tree.entities().len(),
        diagnostics.len()
    );

    ParsedNote {
        id: id.map(str::to_owned),
        source: rope.clone(),
        tree,
        regions: resolution.regions,
        diagnostics,
    }
}

pub fn parse_str(text: &str, id: Option<&str>) -> ParsedNote {
    parse_document(&Rope::from(text), id)
}

/// Parses many notes in parallel, keyed by id. Each parse is independent;
/// collecting into the map is the only shared step.
pub fn parse_many(notes: Vec<(String, String)>) -> BTreeMap<String, ParsedNote> {
    notes
        .into_par_iter()
        .map(|(id, text)| {
            let parsed = parse_str(&text, Some(&id));
            (id, parsed)
        })
        .collect()
}
