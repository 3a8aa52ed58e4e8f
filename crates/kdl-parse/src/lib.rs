//! Event-based parser for KDL documents.
//!
//! The [`Parser`] walks the token stream from [`kdl_tokenizer`] and reports
//! what it finds to a [`ParseCallback`] as a flat sequence of [`Event`]s.
//! Strings and numbers are decoded into [`Value`]s by the [`decode`] module.
//! Parsing stops at the first error.

pub use kdl_tokenizer::{Span, Token, TokenKind, Tokenizer};

mod callback;
pub use callback::ParseCallback;

pub mod decode;

mod event;
pub use event::{Event, Name, ParseError, ParseErrorKind};

mod options;
pub use options::ParseOptions;

mod parser;
pub use parser::Parser;

mod value;
pub use value::{Category, Radix, Value, ValueKind};
