//! Token types for the KDL lexer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `=`
    Equals,
    /// `;`
    Semicolon,
    /// `/-` (comments out the next node, entry, or children block)
    SlashDash,

    // Atoms
    /// Bare identifier: `node`, `my-prop`, `-`
    Ident,
    /// Numeric literal: `42`, `-1.5e3`, `0xff`, `0b1010_1010`
    Number,
    /// One of `true`, `false`, `null`
    Keyword,
    /// Escaped string: `"hello\n"`
    QuotedString,
    /// Raw string: `r"..."`, `r#"..."#`
    RawString,
    /// Multi-line escaped string: `"""` newline ... `"""`
    MultiLineString,
    /// Multi-line raw string: `r#"""` newline ... `"""#`
    MultiLineRawString,

    // Comment tokens
    /// Line comment: `// ...` (the newline is a separate token)
    LineComment,
    /// Block comment: `/* ... */`, possibly nested
    BlockComment,

    // Whitespace tokens
    /// Unicode spaces, tabs, and byte-order marks
    Whitespace,
    /// A single line terminator (`\r\n` counts as one)
    Newline,
    /// `\` followed by optional whitespace, an optional line comment, and a newline
    LineContinuation,

    // Special tokens
    /// End of file
    Eof,
    /// Lexer error
    Error(LexError),
}

/// Why the tokenizer could not produce a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexError {
    /// A `"` or `"""` string was never closed.
    UnterminatedString,
    /// A raw string's closing quote and hash fence were never found.
    UnterminatedRawString,
    /// A `/*` was never balanced by `*/`.
    UnterminatedComment,
    /// A `\` was not followed by a newline (after optional whitespace or comment).
    InvalidLineContinuation,
    /// A character that cannot start any token.
    UnexpectedChar,
}

impl TokenKind {
    /// Whether this token is trivia that may appear between entries of a node.
    pub fn is_node_space(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::BlockComment | TokenKind::LineContinuation
        )
    }

    /// Whether this token is trivia that may appear between nodes.
    pub fn is_line_space(&self) -> bool {
        self.is_node_space() || matches!(self, TokenKind::Newline | TokenKind::LineComment)
    }

    /// Whether this token is any of the string forms.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            TokenKind::QuotedString
                | TokenKind::RawString
                | TokenKind::MultiLineString
                | TokenKind::MultiLineRawString
        )
    }

    /// Whether this token can be used as an identifier (bare or quoted).
    pub fn is_identifier(&self) -> bool {
        *self == TokenKind::Ident || self.is_string()
    }

    /// Whether this token starts a value.
    pub fn is_value(&self) -> bool {
        self.is_string() || matches!(self, TokenKind::Number | TokenKind::Keyword)
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }
}
