use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use nota_engine::{ParsedNote, Severity as NoteSeverity, Span};

/// Renders parse diagnostics against their source, one file per note.
pub struct Reporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl Reporter {
    pub fn new(no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
        }
    }

    /// Emits every diagnostic of `note`. Returns how many were errors.
    pub fn emit(&mut self, id: &str, note: &ParsedNote) -> usize {
        if note.diagnostics.is_empty() {
            return 0;
        }
        let file_id = self
            .files
            .add(format!("{id}.nd"), note.text(Span::new(0, note.source.len())));

        let mut errors = 0;
        for d in &note.diagnostics {
            let severity = match d.severity {
                NoteSeverity::Warning => Severity::Warning,
                NoteSeverity::Error => {
                    errors += 1;
                    Severity::Error
                }
            };
            let diagnostic = Diagnostic::new(severity)
                .with_message(d.message.clone())
                .with_code(d.kind.to_string())
                .with_labels(vec![Label::primary(file_id, d.span.start..d.span.end)]);
            if let Err(e) =
                term::emit_to_write_style(&mut self.writer.lock(), &self.config, &self.files, &diagnostic)
            {
                log::warn!("could not render diagnostic: {e}");
            }
        }
        errors
    }
}
