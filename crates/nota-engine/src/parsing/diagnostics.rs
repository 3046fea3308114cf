//! Recoverable parse problems.
//!
//! Nothing in the parsing pipeline aborts: every malformed construct is
//! recovered (as plain text, an implicit close, or a discarded marker) and
//! reported here so that a note that fails to parse perfectly stays viewable
//! and searchable.

use std::fmt;

use serde::Serialize;

use super::rope::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// The diagnostic taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A malformed microformat token, recovered as plain text (or decoded
    /// with out-of-range components).
    LexError,
    /// A delimiter without a close before EOF or before the end of the
    /// indentation block it was opened in. Recovered by an implicit close.
    UnterminatedSpan,
    /// A closing delimiter with no matching open. The marker is discarded.
    MismatchedSpan,
    /// Two recognizers of equal priority matched the same lexeme. The text
    /// is left as plain text for an external chooser to resolve.
    AmbiguousMarker,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::LexError => "lex-error",
            DiagnosticKind::UnterminatedSpan => "unterminated-span",
            DiagnosticKind::MismatchedSpan => "mismatched-span",
            DiagnosticKind::AmbiguousMarker => "ambiguous-marker",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Source range the diagnostic points at; `span.start` is its position.
    pub span: Span,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Identifier of the document being parsed, when the caller gave one.
    pub document: Option<String>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Warning,
            kind,
            message: message.into(),
            document: None,
        }
    }

    pub fn error(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: Severity::Error,
            kind,
            message: message.into(),
            document: None,
        }
    }

    pub fn position(&self) -> usize {
        self.span.start
    }

    pub fn with_document(mut self, document: Option<&str>) -> Self {
        self.document = document.map(str::to_owned);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if let Some(doc) = &self.document {
            write!(f, "{doc}:")?;
        }
        write!(
            f,
            "{}: {severity}[{}]: {}",
            self.span.start, self.kind, self.message
        )
    }
}
