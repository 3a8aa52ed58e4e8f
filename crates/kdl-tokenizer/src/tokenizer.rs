//! Tokenizer for the KDL document language.

use crate::{LexError, Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from KDL source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Advance by n bytes.
    #[inline]
    fn advance_by(&mut self, n: usize) {
        self.pos += n as u32;
        self.remaining = &self.remaining[n..];
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    /// Consume one character and produce a token of the given kind.
    fn single(&mut self, kind: TokenKind) -> Token<'src> {
        let start = self.pos;
        self.advance();
        self.token(kind, start)
    }

    /// Get the next token.
    ///
    /// Once the input is exhausted this keeps returning [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token<'src> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match c {
            // Structural tokens
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '=' => self.single(TokenKind::Equals),
            ';' => self.single(TokenKind::Semicolon),

            // Strings
            '"' if self.starts_with("\"\"\"") => self.tokenize_multiline_string(),
            '"' => self.tokenize_quoted_string(),
            'r' if self.raw_string_hashes().is_some() => self.tokenize_raw_string(),

            // Comments and slashdash
            '/' if self.starts_with("//") => self.tokenize_line_comment(),
            '/' if self.starts_with("/*") => self.tokenize_block_comment(),
            '/' if self.starts_with("/-") => {
                self.advance_by(2);
                self.token(TokenKind::SlashDash, start)
            }

            '\\' => self.tokenize_line_continuation(),

            // Newline
            '\r' if self.peek_nth(1) == Some('\n') => {
                self.advance_by(2);
                self.token(TokenKind::Newline, start)
            }
            c if is_newline(c) => self.single(TokenKind::Newline),

            // Whitespace
            c if is_whitespace(c) => self.tokenize_whitespace(),

            // Identifiers, numbers and keywords share one lexical shape
            c if is_identifier_char(c) => self.tokenize_bare(),

            // Error: unrecognized character
            _ => self.single(TokenKind::Error(LexError::UnexpectedChar)),
        }
    }

    /// Tokenize a run of unicode spaces.
    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_whitespace(c) {
                self.advance();
            } else {
                break;
            }
        }
        self.token(TokenKind::Whitespace, start)
    }

    /// Tokenize a maximal run of identifier characters and classify it.
    fn tokenize_bare(&mut self) -> Token<'src> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.pos as usize];
        let kind = if looks_numeric(text) {
            TokenKind::Number
        } else if is_keyword(text) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        self.token(kind, start)
    }

    /// Tokenize an escaped string: `"..."`.
    fn tokenize_quoted_string(&mut self) -> Token<'src> {
        let start = self.pos;

        // Consume opening quote
        self.advance();

        loop {
            match self.peek() {
                None => {
                    return self.token(TokenKind::Error(LexError::UnterminatedString), start);
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    // Escape sequence - consume backslash and next char
                    self.advance();
                    if self.peek().is_some() {
                        self.advance();
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        self.token(TokenKind::QuotedString, start)
    }

    /// Tokenize a multi-line escaped string: `"""` ... `"""`.
    ///
    /// Only the extent is found here; the newline and indentation rules are
    /// checked when the string is decoded.
    fn tokenize_multiline_string(&mut self) -> Token<'src> {
        let start = self.pos;
        self.advance_by(3);

        loop {
            if self.starts_with("\"\"\"") {
                self.advance_by(3);
                return self.token(TokenKind::MultiLineString, start);
            }
            match self.advance() {
                None => {
                    return self.token(TokenKind::Error(LexError::UnterminatedString), start);
                }
                Some('\\') => {
                    self.advance();
                }
                Some(_) => {}
            }
        }
    }

    /// If the input is at `r#*"`, return the number of hashes.
    fn raw_string_hashes(&self) -> Option<usize> {
        let after_r = self.remaining.strip_prefix('r')?;
        let hashes = after_r.bytes().take_while(|&b| b == b'#').count();
        after_r[hashes..].starts_with('"').then_some(hashes)
    }

    /// Tokenize a raw string: `r#*"..."#*`, or its multi-line form `r#*"""` ... `"""#*`.
    /// Returns the entire raw string including delimiters.
    fn tokenize_raw_string(&mut self) -> Token<'src> {
        let start = self.pos;
        let hashes = self.raw_string_hashes().unwrap_or_default();

        // Consume `r`, the hashes, and the opening quote
        self.advance_by(1 + hashes + 1);

        // `r#"""` only opens a multi-line string when a newline follows,
        // otherwise it is a raw string whose content starts with `""`.
        let multiline = self.starts_with("\"\"") && matches!(self.peek_nth(2), Some(c) if is_newline(c));
        let mut closing = String::with_capacity(3 + hashes);
        if multiline {
            self.advance_by(2);
            closing.push_str("\"\"\"");
        } else {
            closing.push('"');
        }
        closing.extend(std::iter::repeat_n('#', hashes));

        match self.remaining.find(&closing) {
            Some(idx) => {
                self.advance_by(idx + closing.len());
                let kind = if multiline {
                    TokenKind::MultiLineRawString
                } else {
                    TokenKind::RawString
                };
                self.token(kind, start)
            }
            None => {
                self.advance_by(self.remaining.len());
                self.token(TokenKind::Error(LexError::UnterminatedRawString), start)
            }
        }
    }

    /// Tokenize a line comment: `// ...`.
    fn tokenize_line_comment(&mut self) -> Token<'src> {
        let start = self.pos;

        // Consume `//`
        self.advance_by(2);
        self.skip_to_newline();

        self.token(TokenKind::LineComment, start)
    }

    /// Consume until (not including) the next newline.
    fn skip_to_newline(&mut self) {
        while let Some(c) = self.peek() {
            if is_newline(c) {
                break;
            }
            self.advance();
        }
    }

    /// Tokenize a block comment: `/* ... */`, with nesting.
    fn tokenize_block_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        if self.skip_block_comment() {
            self.token(TokenKind::BlockComment, start)
        } else {
            self.token(TokenKind::Error(LexError::UnterminatedComment), start)
        }
    }

    /// Consume a block comment starting at `/*`. Returns false if it runs off
    /// the end of the input.
    fn skip_block_comment(&mut self) -> bool {
        self.advance_by(2);
        let mut depth = 1usize;
        while depth > 0 {
            if self.starts_with("/*") {
                self.advance_by(2);
                depth += 1;
            } else if self.starts_with("*/") {
                self.advance_by(2);
                depth -= 1;
            } else if self.advance().is_none() {
                return false;
            }
        }
        true
    }

    /// Tokenize a line continuation: `\` whitespace* comment? newline.
    ///
    /// A continuation right before end of input is accepted.
    fn tokenize_line_continuation(&mut self) -> Token<'src> {
        let start = self.pos;

        // Consume `\`
        self.advance();

        loop {
            match self.peek() {
                Some(c) if is_whitespace(c) => {
                    self.advance();
                }
                Some('/') if self.starts_with("/*") => {
                    if !self.skip_block_comment() {
                        return self.token(TokenKind::Error(LexError::UnterminatedComment), start);
                    }
                }
                _ => break,
            }
        }

        if self.starts_with("//") {
            self.skip_to_newline();
        }

        match self.peek() {
            None => {}
            Some('\r') if self.peek_nth(1) == Some('\n') => self.advance_by(2),
            Some(c) if is_newline(c) => {
                self.advance();
            }
            Some(_) => {
                return self.token(TokenKind::Error(LexError::InvalidLineContinuation), start);
            }
        }

        self.token(TokenKind::LineContinuation, start)
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character is a line terminator.
pub fn is_newline(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{85}' | '\u{C}' | '\u{2028}' | '\u{2029}'
    )
}

/// Check if a character is non-newline whitespace (including the byte-order mark).
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Check if a character can appear in a bare identifier.
pub fn is_identifier_char(c: char) -> bool {
    !is_whitespace(c)
        && !is_newline(c)
        && !matches!(
            c,
            '\\' | '/' | '(' | ')' | '{' | '}' | '<' | '>' | ';' | '[' | ']' | '=' | ',' | '"'
        )
}

/// Check if a bare word is one of the reserved keywords.
pub fn is_keyword(text: &str) -> bool {
    matches!(text, "true" | "false" | "null")
}

/// A bare word is a number if it starts with a digit, or a sign then a digit.
fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    digits.as_bytes().first().is_some_and(u8::is_ascii_digit)
}
