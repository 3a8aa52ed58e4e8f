//! Recursive-descent event parser for KDL.

use std::borrow::Cow;

use kdl_tokenizer::{Span, Token, TokenKind, Tokenizer};
use tracing::trace;

use crate::callback::ParseCallback;
use crate::decode::{decode_string, decode_value};
use crate::{Event, Name, ParseError, ParseErrorKind, ParseOptions};

#[cfg(test)]
mod tests;

/// Event-based parser for KDL documents.
///
/// The parser stops at the first error; events already delivered to the
/// callback before that point describe a prefix of the document.
#[derive(Clone)]
pub struct Parser<'src> {
    input: &'src str,
    tokenizer: Tokenizer<'src>,
    /// Single lookahead slot.
    lookahead: Option<Token<'src>>,
    /// End of the last consumed token.
    last_end: u32,
    options: ParseOptions,
    /// Current children nesting depth.
    depth: usize,
    /// Number of enclosing slashdashed units. Events are only emitted at zero.
    discard: usize,
}

type Result<T> = std::result::Result<T, ParseError>;

fn fail<T>(kind: ParseErrorKind, span: Span) -> Result<T> {
    trace!("Parse error {:?} at {}", kind, span);
    Err(ParseError::new(kind, span))
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(input: &'src str) -> Self {
        Self::with_options(input, ParseOptions::default())
    }

    /// Create a new parser with explicit options.
    pub fn with_options(input: &'src str, options: ParseOptions) -> Self {
        Self {
            input,
            tokenizer: Tokenizer::new(input),
            lookahead: None,
            last_end: 0,
            options,
            depth: 0,
            discard: 0,
        }
    }

    /// Parse the whole document, emitting events to `callback`.
    pub fn parse<C: ParseCallback<'src>>(mut self, callback: &mut C) -> Result<()> {
        if u32::try_from(self.input.len()).is_err() {
            return fail(ParseErrorKind::InputTooLarge, Span::empty(0));
        }
        self.parse_nodes(callback, None)?;
        Ok(())
    }

    /// Convenience: parse and collect all events.
    pub fn parse_to_vec(self) -> Result<Vec<Event<'src>>> {
        let mut events = Vec::new();
        self.parse(&mut events)?;
        Ok(events)
    }

    /// Peek at the next token, turning lexical errors into parse errors.
    fn peek(&mut self) -> Result<Token<'src>> {
        let token = match self.lookahead {
            Some(token) => token,
            None => {
                let token = self.tokenizer.next_token();
                self.lookahead = Some(token);
                token
            }
        };
        if let TokenKind::Error(err) = token.kind {
            return fail(err.into(), token.span);
        }
        Ok(token)
    }

    /// Consume the next token.
    fn advance(&mut self) -> Result<Token<'src>> {
        let token = self.peek()?;
        self.lookahead = None;
        self.last_end = token.span.end;
        Ok(token)
    }

    fn emit<C: ParseCallback<'src>>(&self, callback: &mut C, event: Event<'src>) {
        if self.discard == 0 {
            callback.event(event);
        }
    }

    /// Run `f` with event emission suppressed.
    fn discarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.discard += 1;
        let result = f(self);
        self.discard -= 1;
        result
    }

    /// Skip whitespace, block comments and line continuations.
    /// Returns whether anything was skipped.
    fn skip_node_space(&mut self) -> Result<bool> {
        let mut skipped = false;
        while self.peek()?.kind.is_node_space() {
            self.advance()?;
            skipped = true;
        }
        Ok(skipped)
    }

    /// Skip node space plus newlines and line comments.
    fn skip_line_space(&mut self) -> Result<()> {
        while self.peek()?.kind.is_line_space() {
            self.advance()?;
        }
        Ok(())
    }

    /// Parse a sequence of nodes up to end of input (`open` is `None`) or the
    /// `}` matching `open`. Returns the span of the token that ended it.
    fn parse_nodes<C: ParseCallback<'src>>(
        &mut self,
        callback: &mut C,
        open: Option<Span>,
    ) -> Result<Span> {
        trace!("Parsing nodes, opened at {:?}", open);
        loop {
            self.skip_line_space()?;
            let token = self.peek()?;
            match token.kind {
                TokenKind::Eof => {
                    return match open {
                        Some(open) => fail(ParseErrorKind::UnclosedChildren, open),
                        None => Ok(token.span),
                    };
                }
                TokenKind::RBrace => {
                    if open.is_none() {
                        return fail(ParseErrorKind::UnexpectedCloseBrace, token.span);
                    }
                    self.advance()?;
                    return Ok(token.span);
                }
                TokenKind::SlashDash => {
                    self.advance()?;
                    self.skip_node_space()?;
                    self.discarded(|p| p.parse_node(callback))?;
                }
                _ => self.parse_node(callback)?,
            }
        }
    }

    /// Parse one node through its terminator.
    fn parse_node<C: ParseCallback<'src>>(&mut self, callback: &mut C) -> Result<()> {
        let start = self.peek()?.span.start;
        let ty = self.parse_type_annotation()?;

        let token = self.peek()?;
        if !token.kind.is_identifier() {
            return fail(ParseErrorKind::ExpectedNodeName, token.span);
        }
        self.advance()?;
        let name = self.decode_name(&token)?;
        trace!("Parsing node {:?}", name.value);

        let head = Span::new(start, token.span.end);
        self.emit(
            callback,
            Event::NodeStart {
                span: head,
                ty: ty.map(|(ty, _)| ty),
                name,
            },
        );

        let mut end = head.end;
        let mut live_children = false;
        let mut any_children = false;

        loop {
            let spaced = self.skip_node_space()?;
            let token = self.peek()?;
            match token.kind {
                TokenKind::Newline | TokenKind::Semicolon => {
                    self.advance()?;
                    break;
                }
                TokenKind::LineComment | TokenKind::Eof | TokenKind::RBrace => break,
                TokenKind::LBrace => {
                    if live_children {
                        return fail(ParseErrorKind::DuplicateChildren, token.span);
                    }
                    end = self.parse_children(callback)?;
                    live_children = true;
                    any_children = true;
                }
                TokenKind::SlashDash => {
                    self.advance()?;
                    self.skip_node_space()?;
                    let next = self.peek()?;
                    if next.kind == TokenKind::LBrace {
                        self.discarded(|p| p.parse_children(callback))?;
                        any_children = true;
                    } else if any_children {
                        return fail(ParseErrorKind::EntryAfterChildren, token.span);
                    } else if !spaced {
                        return fail(ParseErrorKind::MissingWhitespace, token.span);
                    } else {
                        self.discarded(|p| p.parse_entry(callback))?;
                    }
                    end = self.last_end;
                }
                _ => {
                    if any_children {
                        return fail(ParseErrorKind::EntryAfterChildren, token.span);
                    }
                    if !spaced && starts_entry(token.kind) {
                        return fail(ParseErrorKind::MissingWhitespace, token.span);
                    }
                    end = self.parse_entry(callback)?;
                }
            }
        }

        self.emit(
            callback,
            Event::NodeEnd {
                span: Span::new(start, end),
            },
        );
        Ok(())
    }

    /// Parse a `{ ... }` children block. Returns the end offset of the `}`.
    fn parse_children<C: ParseCallback<'src>>(&mut self, callback: &mut C) -> Result<u32> {
        let open = self.advance()?;
        if self.depth >= self.options.max_depth {
            return fail(ParseErrorKind::NestingTooDeep, open.span);
        }
        trace!("Parsing children at depth {}", self.depth + 1);

        self.depth += 1;
        self.emit(callback, Event::ChildrenStart { span: open.span });
        let close = self.parse_nodes(callback, Some(open.span))?;
        self.emit(callback, Event::ChildrenEnd { span: close });
        self.depth -= 1;

        Ok(close.end)
    }

    /// Parse an argument or a property. Returns the end offset of the entry.
    fn parse_entry<C: ParseCallback<'src>>(&mut self, callback: &mut C) -> Result<u32> {
        let start = self.peek()?.span.start;
        let ty = self.parse_type_annotation()?;
        let token = self.peek()?;

        let name = match token.kind {
            kind if kind.is_identifier() => {
                self.advance()?;
                if self.peek()?.kind == TokenKind::Equals {
                    // A type belongs after the `=`, on the value
                    if let Some((_, ty_span)) = ty {
                        return fail(ParseErrorKind::MisplacedTypeAnnotation, ty_span);
                    }
                    Some(self.decode_name(&token)?)
                } else {
                    None
                }
            }
            TokenKind::Number | TokenKind::Keyword => {
                self.advance()?;
                if self.peek()?.kind == TokenKind::Equals {
                    return fail(ParseErrorKind::InvalidPropertyName, token.span);
                }
                None
            }
            _ if ty.is_some() => return fail(ParseErrorKind::ExpectedValue, token.span),
            _ => return fail(ParseErrorKind::UnexpectedToken, token.span),
        };

        let (ty, value_token) = if name.is_some() {
            trace!("Parsing property {:?}", token.text);
            // Consume `=`
            self.advance()?;
            let ty = self.parse_type_annotation()?;
            let value_token = self.advance()?;
            (ty, value_token)
        } else {
            trace!("Parsing argument {:?}", token.text);
            (ty, token)
        };

        let value = decode_value(&value_token)?;
        let span = Span::new(start, value_token.span.end);
        self.emit(
            callback,
            Event::Entry {
                span,
                ty: ty.map(|(ty, _)| ty),
                name,
                value,
            },
        );
        Ok(span.end)
    }

    /// Parse an optional `(type)` annotation.
    ///
    /// Returns the type name and the span of the whole annotation.
    fn parse_type_annotation(&mut self) -> Result<Option<(Name<'src>, Span)>> {
        let open = self.peek()?;
        if open.kind != TokenKind::LParen {
            return Ok(None);
        }
        self.advance()?;

        let token = self.advance()?;
        if !token.kind.is_identifier() {
            return match token.kind {
                TokenKind::Eof => fail(ParseErrorKind::UnclosedTypeAnnotation, open.span),
                _ => fail(ParseErrorKind::ExpectedTypeName, token.span),
            };
        }

        let close = self.peek()?;
        if close.kind != TokenKind::RParen {
            return fail(
                ParseErrorKind::UnclosedTypeAnnotation,
                Span::new(open.span.start, token.span.end),
            );
        }
        self.advance()?;

        let span = Span::new(open.span.start, close.span.end);
        if self.peek()?.kind.is_line_space() {
            return fail(ParseErrorKind::MisplacedTypeAnnotation, span);
        }

        let name = self.decode_name(&token)?;
        trace!("Type annotation {:?}", name.value);
        Ok(Some((name, span)))
    }

    /// Decode a bare or quoted identifier.
    fn decode_name(&self, token: &Token<'src>) -> Result<Name<'src>> {
        let value = match token.kind {
            TokenKind::Ident => Cow::Borrowed(token.text),
            _ => decode_string(token)?,
        };
        Ok(Name {
            value,
            span: token.span,
        })
    }
}

/// Whether a token begins an argument or property.
fn starts_entry(kind: TokenKind) -> bool {
    kind.is_value() || matches!(kind, TokenKind::Ident | TokenKind::LParen)
}
