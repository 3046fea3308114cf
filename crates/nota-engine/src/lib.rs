pub mod io;
pub mod models;
pub mod parsing;
pub mod query;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use io::*;
pub use models::NoteFile;
pub use parsing::{
    Diagnostic, DiagnosticKind, EntityKind, EntityValue, NodeId, NodeKind, ParsedNote, Severity,
    Span, Tree, parse_document, parse_many, parse_str,
};
pub use query::{BlockRef, NoteIndex, QueryError, SearchHit, TermMatches};
