use std::fmt;

use crate::span::Span;

/// A compiler diagnostic (error or warning) tied to a source line.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// The exit-contract line required by the CLI surface: `"<line>: <message>"`.
    pub fn contract_line(&self) -> String {
        format!("{}: {}", self.span.line, self.message)
    }

    /// Render the diagnostic to stderr with source context, via ariadne.
    /// The CLI binaries print `contract_line()` for the required exit
    /// contract; this is the richer, interactive presentation.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (start, end) = line_byte_range(source, self.span.line);

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, filename, start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((filename, Source::from(source)))
            .unwrap();
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.contract_line())
    }
}

/// Byte offset range `[start, end)` covering the given zero-based line,
/// for ariadne's span-based rendering.
fn line_byte_range(source: &str, line: u32) -> (usize, usize) {
    let mut offset = 0usize;
    for (i, l) in source.split('\n').enumerate() {
        let end = offset + l.len();
        if i as u32 == line {
            return (offset, end.max(offset));
        }
        offset = end + 1;
    }
    (offset, offset)
}

/// Render a list of diagnostics with source context.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// Print the exit-contract line for each diagnostic to stderr.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        eprintln!("{}", diag.contract_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let span = Span::new(10);
        let d = Diagnostic::error("type mismatch".to_string(), span);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "type mismatch");
        assert_eq!(d.span.line, 10);
        assert!(d.notes.is_empty());
        assert!(d.help.is_none());
    }

    #[test]
    fn test_warning_construction() {
        let d = Diagnostic::warning("unused variable".to_string(), Span::dummy());
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn test_with_note_and_help() {
        let d = Diagnostic::error("error".to_string(), Span::dummy())
            .with_note("expected int".to_string())
            .with_help("try casting".to_string());
        assert_eq!(d.notes, vec!["expected int".to_string()]);
        assert_eq!(d.help.as_deref(), Some("try casting"));
    }

    #[test]
    fn test_contract_line() {
        let d = Diagnostic::error("unexpected token".to_string(), Span::new(3));
        assert_eq!(d.contract_line(), "3: unexpected token");
        assert_eq!(d.to_string(), "3: unexpected token");
    }

    #[test]
    fn test_render_does_not_panic() {
        let source = "class Main {\n  function void main() {\n  }\n}\n";
        let d = Diagnostic::error("bad token".to_string(), Span::new(1));
        d.render("Main.jack", source);
    }

    #[test]
    fn test_line_byte_range() {
        let source = "abc\ndefg\nhi";
        assert_eq!(line_byte_range(source, 0), (0, 3));
        assert_eq!(line_byte_range(source, 1), (4, 8));
        assert_eq!(line_byte_range(source, 2), (9, 11));
    }
}
