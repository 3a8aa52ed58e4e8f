//! Diagnostic rendering for parse errors.

use std::borrow::Cow;
use std::fmt;
use std::io;

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use kdl_parse::{ParseErrorKind, Span};

/// A parse failure, with the input it happened in.
///
/// Line and column are not computed here; [`Error::render`] derives them
/// from the input when a report is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error<'src> {
    input: &'src [u8],
    span: Span,
    kind: ParseErrorKind,
}

impl<'src> Error<'src> {
    pub(crate) fn new(input: &'src [u8], kind: ParseErrorKind, span: Span) -> Self {
        Self { input, span, kind }
    }

    /// The whole input that was being parsed.
    pub fn input(&self) -> &'src [u8] {
        self.input
    }

    /// Byte range of the offending text.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The offending bytes, as a sub-slice of [`Error::input`].
    pub fn snippet(&self) -> &'src [u8] {
        let range: std::ops::Range<usize> = self.span.into();
        self.input.get(range).unwrap_or_default()
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// A short machine-oriented label, like "unterminated string".
    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    /// A longer hint on how to fix the input.
    pub fn help(&self) -> Option<&'static str> {
        self.kind.help()
    }

    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str) -> String {
        let mut output = Vec::new();
        if self.write_report(filename, &mut output).is_err() {
            return self.to_string();
        }
        String::from_utf8(output).unwrap_or_else(|_| self.to_string())
    }

    /// Write the error report to a writer.
    pub fn write_report<W: io::Write>(&self, filename: &str, writer: W) -> io::Result<()> {
        let source = String::from_utf8_lossy(self.input);
        let range = self.report_range(&source);

        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_config(Config::default().with_index_type(IndexType::Byte))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(self.label_message())
                    .with_color(Color::Red),
            );
        if let Some(help) = self.help() {
            report = report.with_help(help);
        }

        report
            .finish()
            .write((filename, Source::from(source.as_ref())), writer)
    }

    /// The span clamped to the text ariadne will see, never empty.
    fn report_range(&self, source: &Cow<'_, str>) -> std::ops::Range<usize> {
        let start = (self.span.start as usize).min(source.len());
        let end = match source {
            // Invalid bytes were replaced; only the text before the first one is intact
            Cow::Owned(_) => start,
            Cow::Borrowed(_) => (self.span.end as usize).min(source.len()),
        };
        if end > start {
            return start..end;
        }
        match source[start..].chars().next() {
            Some(c) => start..start + c.len_utf8(),
            None => match source[..start].chars().next_back() {
                Some(c) => start - c.len_utf8()..start,
                None => start..start,
            },
        }
    }

    fn label_message(&self) -> &'static str {
        match self.kind {
            ParseErrorKind::UnterminatedString | ParseErrorKind::UnterminatedRawString => {
                "string starts here"
            }
            ParseErrorKind::UnterminatedComment => "comment starts here",
            ParseErrorKind::UnclosedChildren => "children block opened here",
            ParseErrorKind::UnclosedTypeAnnotation => "type annotation opened here",
            ParseErrorKind::DuplicateChildren => "second children block",
            ParseErrorKind::NestingTooDeep => "too deeply nested",
            ParseErrorKind::InvalidUtf8 => "not valid UTF-8",
            ref kind => kind.label(),
        }
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for Error<'_> {}
