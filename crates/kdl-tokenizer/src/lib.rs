//! A tokenizer for KDL documents

mod span;
pub use span::Span;

mod token;
pub use token::{LexError, Token, TokenKind};

mod tokenizer;
pub use tokenizer::{Tokenizer, is_identifier_char, is_keyword, is_newline, is_whitespace};
