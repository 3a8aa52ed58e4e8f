//! Document tree for KDL.
//!
//! [`parse`] turns raw bytes into a [`Document`]: an ordered list of
//! [`Node`]s, each with a name, optional type annotation, arguments and
//! properties ([`Entry`]), and an optional nested [`Document`] of children.
//!
//! Strings in the tree borrow from the input where no escape or dedent had
//! to be resolved, so a `Document<'src>` cannot outlive the bytes it was
//! parsed from. Use [`Document::into_owned`] to detach it.
//!
//! On failure, [`Error`] carries the offending span and can render an
//! annotated report with [`Error::render`].

mod builder;
mod diagnostic;
mod node;

pub use builder::TreeBuilder;
pub use diagnostic::Error;
pub use kdl_parse::{Category, ParseErrorKind, ParseOptions, Radix, Span, Value, ValueKind};
pub use node::{Document, Entry, Identifier, Node, NodeKey};

use tracing::debug;

/// Parse a KDL document from raw bytes.
pub fn parse(input: &[u8]) -> Result<Document<'_>, Error<'_>> {
    parse_with_options(input, ParseOptions::default())
}

/// Parse a KDL document with explicit options.
pub fn parse_with_options(
    input: &[u8],
    options: ParseOptions,
) -> Result<Document<'_>, Error<'_>> {
    if u32::try_from(input.len()).is_err() {
        debug!("Refusing {} byte input", input.len());
        return Err(Error::new(
            input,
            ParseErrorKind::InputTooLarge,
            Span::empty(0),
        ));
    }

    let source = match std::str::from_utf8(input) {
        Ok(source) => source,
        Err(err) => {
            let start = err.valid_up_to();
            let end = err.error_len().map_or(input.len(), |len| start + len);
            debug!("Invalid UTF-8 at offset {}", start);
            return Err(Error::new(
                input,
                ParseErrorKind::InvalidUtf8,
                Span::new(start as u32, end as u32),
            ));
        }
    };

    parse_str(source, options)
}

pub(crate) fn parse_str(source: &str, options: ParseOptions) -> Result<Document<'_>, Error<'_>> {
    let mut builder = TreeBuilder::new();
    match kdl_parse::Parser::with_options(source, options).parse(&mut builder) {
        Ok(()) => Ok(builder.finish()),
        Err(err) => {
            debug!("Parse failed: {}", err);
            Err(Error::new(source.as_bytes(), err.kind, err.span))
        }
    }
}
