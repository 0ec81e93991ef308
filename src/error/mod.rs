//! Error types shared by every stage of a conversion
//!
//! Parse and translation problems are recorded as diagnostics and degrade to
//! opaque nodes or placeholders; only configuration problems (an unknown
//! language tag) abort a job.

mod diagnostics;

pub use diagnostics::Diagnostics;

use colored::*;
use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span information for multi-character ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    pub fn single(location: SourceLocation) -> Self {
        Self {
            start: location,
            end: location,
        }
    }

    /// Get the start line number
    pub fn start_line(&self) -> usize {
        self.start.line
    }

    /// Get the end line number
    pub fn end_line(&self) -> usize {
        self.end.line
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Error context providing additional information
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorContext {
    pub span: Option<Span>,
    pub note: Option<String>,
    pub help: Option<String>,
}

/// Main error type of the engine
#[derive(Debug, Clone, Serialize)]
pub struct ConvertError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: ErrorContext,
}

impl ConvertError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn unsupported_language(tag: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedLanguage,
            format!("no component registered for language '{}'", tag),
        )
    }

    pub fn translation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TranslationError, message)
    }

    pub fn unsupported_construct(construct: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedConstruct,
            format!("visitor does not handle '{}' nodes", construct),
        )
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.context.span = Some(span);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.context.note = Some(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }
}

/// Categories of errors that can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// A span matched no construct template; it became an opaque node
    ParseError,
    /// No front-end or back-end is registered for the requested tag
    UnsupportedLanguage,
    /// A canonical construct has no mapping rule for the target
    TranslationError,
    /// A visitor was dispatched on a node kind it does not handle
    UnsupportedConstruct,
    /// Raised only by file-access collaborators
    IoError,
    /// A component panicked; recorded by batch conversion
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse error",
            ErrorKind::UnsupportedLanguage => "unsupported language",
            ErrorKind::TranslationError => "translation error",
            ErrorKind::UnsupportedConstruct => "unsupported construct",
            ErrorKind::IoError => "I/O error",
            ErrorKind::InternalError => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context.span {
            Some(span) => write!(f, "{}: {}: {}", span, self.kind, self.message)?,
            None => write!(f, "{}: {}", self.kind, self.message)?,
        }

        if let Some(note) = &self.context.note {
            write!(f, "\nnote: {}", note)?;
        }

        if let Some(help) = &self.context.help {
            write!(f, "\nhelp: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for ConvertError {}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// How a diagnostic is labelled when printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Most source lines quoted for one span; longer spans are elided
const MAX_SNIPPET_LINES: usize = 3;

/// Renders a diagnostic with the source lines it covers
pub struct ErrorFormatter<'a> {
    error: &'a ConvertError,
    source: &'a str,
    filename: Option<&'a str>,
    severity: Severity,
    use_color: bool,
}

impl<'a> ErrorFormatter<'a> {
    pub fn new(error: &'a ConvertError, source: &'a str) -> Self {
        Self {
            error,
            source,
            filename: None,
            severity: Severity::Error,
            use_color: true,
        }
    }

    pub fn with_filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    fn paint(&self, text: &str, style: fn(ColoredString) -> ColoredString) -> String {
        if self.use_color {
            style(text.normal()).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        let location = match (self.filename, &self.error.context.span) {
            (Some(file), Some(span)) => Some(format!("{}:{}", file, span.start)),
            (None, Some(span)) => Some(span.start.to_string()),
            (Some(file), None) => Some(file.to_string()),
            (None, None) => None,
        };
        if let Some(location) = location {
            output.push_str(&self.paint(&location, |s| s.bold()));
            output.push_str(": ");
        }

        let label = match self.severity {
            Severity::Error => self.paint(&self.error.kind.to_string(), |s| s.red().bold()),
            Severity::Warning => self.paint(&format!("warning ({})", self.error.kind), |s| s.yellow().bold()),
        };
        output.push_str(&format!("{}: {}\n", label, self.error.message));

        if let Some(span) = &self.error.context.span {
            output.push_str(&self.snippet(span));
        }

        if let Some(note) = &self.error.context.note {
            output.push_str(&format!("\n{}: {}", self.paint("note", |s| s.blue().bold()), note));
        }
        if let Some(help) = &self.error.context.help {
            output.push_str(&format!("\n{}: {}", self.paint("help", |s| s.green().bold()), help));
        }

        output.trim_end_matches('\n').to_string()
    }

    /// Quoted source lines with a gutter; a single-line span gets a caret underline
    fn snippet(&self, span: &Span) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        if span.start.line == 0 || span.start.line > lines.len() {
            return String::new();
        }
        let last = span.end.line.clamp(span.start.line, lines.len());
        let shown = (last - span.start.line + 1).min(MAX_SNIPPET_LINES);
        let width = (span.start.line + shown - 1).to_string().len();
        let bar = self.paint("|", |s| s.blue());

        let mut out = String::new();
        for number in span.start.line..span.start.line + shown {
            let gutter = self.paint(&format!("{:>width$}", number, width = width), |s| s.blue().bold());
            out.push_str(&format!("{} {} {}\n", gutter, bar, lines[number - 1]));
        }
        if last - span.start.line + 1 > shown {
            out.push_str(&format!("{} {} ... ({} more line(s))\n", " ".repeat(width), bar, last - span.start.line + 1 - shown));
        }
        if span.start.line == span.end.line {
            let length = span.end.column.saturating_sub(span.start.column).max(1);
            out.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(width),
                bar,
                " ".repeat(span.start.column.saturating_sub(1)),
                self.paint(&"^".repeat(length), |s| s.red().bold())
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_span_note_and_help() {
        let err = ConvertError::parse("no template matched")
            .with_span(Span::new(SourceLocation::new(3, 1), SourceLocation::new(3, 9)))
            .with_note("kept as opaque text")
            .with_help("check the declaration syntax");

        assert_eq!(
            err.to_string(),
            "3:1-3:9: parse error: no template matched\nnote: kept as opaque text\nhelp: check the declaration syntax"
        );
    }

    #[test]
    fn test_formatter_points_at_column() {
        let source = "fn ok() {}\nfn broken(\n";
        let err = ConvertError::parse("unterminated parameter list")
            .with_span(Span::single(SourceLocation::new(2, 4)));
        let text = ErrorFormatter::new(&err, source)
            .with_filename("lib.rs")
            .with_color(false)
            .format();

        assert!(text.starts_with("lib.rs:2:4: parse error: unterminated parameter list\n"));
        assert!(text.contains("2 | fn broken("));
        assert!(text.ends_with("  |    ^"));
    }

    #[test]
    fn test_formatter_elides_long_spans_and_labels_warnings() {
        let source = "a\nb\nc\nd\ne\n";
        let err = ConvertError::translation("restructured")
            .with_span(Span::new(SourceLocation::new(1, 1), SourceLocation::new(5, 1)))
            .with_help("review it");
        let text = ErrorFormatter::new(&err, source)
            .with_severity(Severity::Warning)
            .with_color(false)
            .format();

        assert_eq!(
            text,
            "1:1: warning (translation error): restructured\n1 | a\n2 | b\n3 | c\n  | ... (2 more line(s))\n\nhelp: review it"
        );
    }
}
