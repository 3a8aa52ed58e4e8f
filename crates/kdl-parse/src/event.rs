//! Event and error types for the KDL event-based parser.

use std::borrow::Cow;
use std::fmt;

use kdl_tokenizer::LexError;

use crate::{Span, Value};

/// A decoded identifier (node name, property name or type) and where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name<'src> {
    /// The identifier after unquoting and escape processing.
    pub value: Cow<'src, str>,
    /// Span of the identifier as written, quotes included.
    pub span: Span,
}

/// Events emitted by the parser.
///
/// Every `NodeStart` is matched by a `NodeEnd`, every `ChildrenStart` by a
/// `ChildrenEnd`. Slashdashed nodes, entries and children blocks produce no
/// events at all.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'src> {
    /// Start of a node.
    NodeStart {
        /// Span of the node head: type annotation and name.
        span: Span,
        /// Type annotation without the parentheses.
        ty: Option<Name<'src>>,
        /// Node name.
        name: Name<'src>,
    },
    /// An argument (`name` is `None`) or a property.
    Entry {
        /// Span of the whole entry, type annotation and key included.
        span: Span,
        /// Type annotation of the value.
        ty: Option<Name<'src>>,
        /// Property name.
        name: Option<Name<'src>>,
        /// The decoded value.
        value: Value<'src>,
    },
    /// Start of a children block `{`.
    ChildrenStart {
        /// Span of the opening brace.
        span: Span,
    },
    /// End of a children block.
    ChildrenEnd {
        /// Span of the closing brace.
        span: Span,
    },
    /// End of a node.
    NodeEnd {
        /// Span of the whole node, terminator excluded.
        span: Span,
    },
}

/// Parse error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    // Encoding
    /// Input is not valid UTF-8.
    InvalidUtf8,
    /// Input does not fit in 32-bit offsets.
    InputTooLarge,

    // Lexical
    /// A `"` or `"""` string was never closed.
    UnterminatedString,
    /// A raw string was never closed.
    UnterminatedRawString,
    /// A `/*` comment was never closed.
    UnterminatedComment,
    /// A character that cannot start any token.
    UnexpectedChar,
    /// `\` not followed by a newline.
    InvalidLineContinuation,
    /// Unknown escape sequence in a string.
    InvalidEscape(String),
    /// `\u{...}` that is malformed or does not name a Unicode scalar value.
    InvalidUnicodeEscape,
    /// A number that does not follow the number grammar at all.
    InvalidNumber,
    /// A digit not valid for the literal's radix.
    InvalidDigit,
    /// An underscore at the start of a digit group.
    MisplacedUnderscore,
    /// A radix prefix, fraction or exponent with no digits.
    MissingDigits,
    /// Opening `"""` not followed by a newline.
    MultilineMissingNewline,
    /// Content on the same line before the closing `"""`.
    MultilineClosingLine,
    /// A multi-line string line that does not start with the closing indentation.
    InconsistentIndent,

    // Grammar
    /// A token that cannot appear here.
    UnexpectedToken,
    /// Expected a node name.
    ExpectedNodeName,
    /// Expected a value.
    ExpectedValue,
    /// Expected a type name inside `( )`.
    ExpectedTypeName,
    /// `(type` without `)`.
    UnclosedTypeAnnotation,
    /// A type annotation separated from what it annotates, or placed before a property name.
    MisplacedTypeAnnotation,
    /// Two entries (or a name and an entry) with nothing between them.
    MissingWhitespace,
    /// A bare identifier used as a value.
    BareIdentifierValue,
    /// A number or keyword used as a property name.
    InvalidPropertyName,
    /// `{` without a matching `}`.
    UnclosedChildren,
    /// `}` without a matching `{`.
    UnexpectedCloseBrace,
    /// An argument or property after the node's children block.
    EntryAfterChildren,
    /// A second children block on the same node.
    DuplicateChildren,

    // Numeric
    /// Integer literal outside the signed 64-bit range.
    IntegerOverflow,

    // Limits
    /// Children blocks nested deeper than the configured limit.
    NestingTooDeep,
}

impl ParseErrorKind {
    /// A short machine-oriented label.
    pub fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::InvalidUtf8 => "invalid utf-8",
            ParseErrorKind::InputTooLarge => "input too large",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::UnterminatedRawString => "unterminated raw string",
            ParseErrorKind::UnterminatedComment => "unterminated block comment",
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::InvalidLineContinuation => "invalid line continuation",
            ParseErrorKind::InvalidEscape(_) => "invalid escape",
            ParseErrorKind::InvalidUnicodeEscape => "invalid unicode escape",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::InvalidDigit => "invalid digit",
            ParseErrorKind::MisplacedUnderscore => "misplaced underscore",
            ParseErrorKind::MissingDigits => "missing digits",
            ParseErrorKind::MultilineMissingNewline => "missing newline after opening quotes",
            ParseErrorKind::MultilineClosingLine => "content before closing quotes",
            ParseErrorKind::InconsistentIndent => "inconsistent indentation",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::ExpectedNodeName => "expected node name",
            ParseErrorKind::ExpectedValue => "expected value",
            ParseErrorKind::ExpectedTypeName => "expected type name",
            ParseErrorKind::UnclosedTypeAnnotation => "unclosed type annotation",
            ParseErrorKind::MisplacedTypeAnnotation => "misplaced type annotation",
            ParseErrorKind::MissingWhitespace => "missing whitespace",
            ParseErrorKind::BareIdentifierValue => "bare identifier used as value",
            ParseErrorKind::InvalidPropertyName => "invalid property name",
            ParseErrorKind::UnclosedChildren => "unclosed children block",
            ParseErrorKind::UnexpectedCloseBrace => "unexpected closing brace",
            ParseErrorKind::EntryAfterChildren => "entry after children block",
            ParseErrorKind::DuplicateChildren => "duplicate children block",
            ParseErrorKind::IntegerOverflow => "integer overflow",
            ParseErrorKind::NestingTooDeep => "nesting too deep",
        }
    }

    /// A longer human-oriented hint, where there is something to suggest.
    pub fn help(&self) -> Option<&'static str> {
        Some(match self {
            ParseErrorKind::InvalidUtf8 => "KDL documents must be encoded as UTF-8",
            ParseErrorKind::InputTooLarge => "split the document into files smaller than 4 GiB",
            ParseErrorKind::UnterminatedString => "add a closing `\"`",
            ParseErrorKind::UnterminatedRawString => {
                "close the string with `\"` followed by the same number of `#` it was opened with"
            }
            ParseErrorKind::UnterminatedComment => "every `/*` needs a matching `*/`",
            ParseErrorKind::UnexpectedChar => {
                "quote this text if it is part of a name or value: `\"...\"`"
            }
            ParseErrorKind::InvalidLineContinuation => {
                "a `\\` outside a string must be the last thing on its line"
            }
            ParseErrorKind::InvalidEscape(_) => {
                "valid escapes are \\n, \\r, \\t, \\\\, \\/, \\\", \\b, \\f and \\u{XXXX}"
            }
            ParseErrorKind::InvalidUnicodeEscape => {
                "use 1 to 6 hex digits naming a Unicode scalar value, like \\u{1F600}"
            }
            ParseErrorKind::InvalidNumber => "numbers look like 42, -1.5e3, 0xff, 0o755 or 0b1010",
            ParseErrorKind::InvalidDigit => "this digit is not valid for the number's radix",
            ParseErrorKind::MisplacedUnderscore => {
                "underscores may only separate digits, not start a digit group"
            }
            ParseErrorKind::MissingDigits => "add at least one digit",
            ParseErrorKind::MultilineMissingNewline => {
                "start the string's content on the line after the opening quotes"
            }
            ParseErrorKind::MultilineClosingLine => {
                "put the closing quotes on their own line, after optional indentation"
            }
            ParseErrorKind::InconsistentIndent => {
                "every line must start with the same indentation as the closing quotes"
            }
            ParseErrorKind::ExpectedNodeName => "node names are identifiers or strings",
            ParseErrorKind::ExpectedValue => "values are strings, numbers, true, false or null",
            ParseErrorKind::ExpectedTypeName => "write a name between the parentheses: (name)",
            ParseErrorKind::UnclosedTypeAnnotation => "add a closing `)`",
            ParseErrorKind::MisplacedTypeAnnotation => {
                "a type annotation goes directly before the node name or value, with no space"
            }
            ParseErrorKind::MissingWhitespace => "separate entries with whitespace",
            ParseErrorKind::BareIdentifierValue => "quote the value: \"...\"",
            ParseErrorKind::InvalidPropertyName => "quote the property name: \"...\"=value",
            ParseErrorKind::UnclosedChildren => "add a closing `}`",
            ParseErrorKind::UnexpectedCloseBrace => "remove the `}` or add a matching `{`",
            ParseErrorKind::EntryAfterChildren => {
                "move the argument or property before the children block"
            }
            ParseErrorKind::DuplicateChildren => "merge the children blocks into one",
            ParseErrorKind::IntegerOverflow => "integers must fit in a signed 64-bit integer",
            ParseErrorKind::NestingTooDeep => "flatten the document or raise the nesting limit",
            ParseErrorKind::UnexpectedToken => return None,
        })
    }
}

impl From<LexError> for ParseErrorKind {
    fn from(err: LexError) -> Self {
        match err {
            LexError::UnterminatedString => ParseErrorKind::UnterminatedString,
            LexError::UnterminatedRawString => ParseErrorKind::UnterminatedRawString,
            LexError::UnterminatedComment => ParseErrorKind::UnterminatedComment,
            LexError::InvalidLineContinuation => ParseErrorKind::InvalidLineContinuation,
            LexError::UnexpectedChar => ParseErrorKind::UnexpectedChar,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidEscape(seq) => write!(f, "invalid escape `{seq}`"),
            kind => f.write_str(kind.label()),
        }
    }
}

/// The first error found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// The exact bytes that triggered it.
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for ParseError {}
