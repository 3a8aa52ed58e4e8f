//! Typed values carried by arguments and properties.

use std::borrow::Cow;
use std::fmt;

/// The base an integer literal was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Radix {
    /// `0b...`
    Binary,
    /// `0o...`
    Octal,
    /// Plain digits.
    #[default]
    Decimal,
    /// `0x...`
    Hexadecimal,
}

impl Radix {
    /// The numeric base: 2, 8, 10 or 16.
    pub fn base(self) -> u32 {
        match self {
            Radix::Binary => 2,
            Radix::Octal => 8,
            Radix::Decimal => 10,
            Radix::Hexadecimal => 16,
        }
    }

    /// The literal prefix for this radix, empty for decimal.
    pub fn prefix(self) -> &'static str {
        match self {
            Radix::Binary => "0b",
            Radix::Octal => "0o",
            Radix::Decimal => "",
            Radix::Hexadecimal => "0x",
        }
    }
}

/// Tag of a [`Value`], laid out as category bits plus a variant.
///
/// The high bits name the category (`STRING`, `INTEGER`, `FLOAT`, `BOOL`),
/// null is all zeroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum ValueKind {
    Null = 0x00,
    RawString = 0x10,
    String = 0x11,
    Base2 = 0x20,
    Base8 = 0x21,
    Base10 = 0x22,
    Base16 = 0x23,
    Base10Float = 0x40,
    Bool = 0x80,
}

impl ValueKind {
    /// Category bit shared by both string kinds.
    pub const STRING: u8 = 0x10;
    /// Category bit shared by the four integer kinds.
    pub const INTEGER: u8 = 0x20;
    /// Category bit for floats.
    pub const FLOAT: u8 = 0x40;
    /// Category bit for booleans.
    pub const BOOL: u8 = 0x80;

    /// The raw tag byte.
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn is_null(self) -> bool {
        self.bits() == 0
    }

    pub fn is_string(self) -> bool {
        self.bits() & Self::STRING != 0
    }

    pub fn is_integer(self) -> bool {
        self.bits() & Self::INTEGER != 0
    }

    pub fn is_float(self) -> bool {
        self.bits() & Self::FLOAT != 0
    }

    pub fn is_bool(self) -> bool {
        self.bits() & Self::BOOL != 0
    }

    /// Collapse the tag into one of the five categories.
    pub fn category(self) -> Category {
        if self.is_string() {
            Category::String
        } else if self.is_integer() {
            Category::Integer
        } else if self.is_float() {
            Category::Float
        } else if self.is_bool() {
            Category::Bool
        } else {
            Category::Null
        }
    }
}

/// The five value categories, for callers that branch over all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
#[repr(u8)]
pub enum Category {
    Null,
    String,
    Integer,
    Float,
    Bool,
}

/// A decoded argument or property value.
///
/// String payloads borrow from the source unless decoding had to rewrite
/// them (escapes, multi-line dedent).
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'src> {
    /// `null`
    Null,
    /// A raw string, `r"..."` or `r#"""` ... `"""#`.
    RawString(Cow<'src, str>),
    /// An escaped string, `"..."` or `"""` ... `"""`.
    String(Cow<'src, str>),
    /// An integer with the radix it was written in.
    Integer(i64, Radix),
    /// A decimal number with a fraction or exponent.
    Float(f64),
    /// `true` or `false`
    Bool(bool),
}

impl<'src> Value<'src> {
    /// The tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::RawString(_) => ValueKind::RawString,
            Value::String(_) => ValueKind::String,
            Value::Integer(_, Radix::Binary) => ValueKind::Base2,
            Value::Integer(_, Radix::Octal) => ValueKind::Base8,
            Value::Integer(_, Radix::Decimal) => ValueKind::Base10,
            Value::Integer(_, Radix::Hexadecimal) => ValueKind::Base16,
            Value::Float(_) => ValueKind::Base10Float,
            Value::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn category(&self) -> Category {
        self.kind().category()
    }

    /// The string payload, for either string kind.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::RawString(s) | Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n, _) => Some(*n),
            _ => None,
        }
    }

    /// The float payload. Integers are not converted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The radix of an integer value.
    pub fn radix(&self) -> Option<Radix> {
        match self {
            Value::Integer(_, radix) => Some(*radix),
            _ => None,
        }
    }

    /// Detach the value from the source buffer.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::RawString(s) => Value::RawString(Cow::Owned(s.into_owned())),
            Value::String(s) => Value::String(Cow::Owned(s.into_owned())),
            Value::Integer(n, radix) => Value::Integer(n, radix),
            Value::Float(n) => Value::Float(n),
            Value::Bool(b) => Value::Bool(b),
        }
    }
}

/// Hashes needed so that no `"` inside `text` closes the raw string early.
fn raw_fence_len(text: &str) -> usize {
    text.match_indices('"')
        .map(|(i, _)| 1 + text[i + 1..].bytes().take_while(|&b| b == b'#').count())
        .max()
        .unwrap_or(0)
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::RawString(s) => {
                let fence = "#".repeat(raw_fence_len(s));
                write!(f, "r{fence}\"{s}\"{fence}")
            }
            Value::String(s) => write!(f, "{s:?}"),
            Value::Integer(n, radix) => {
                let sign = if *n < 0 { "-" } else { "" };
                let abs = n.unsigned_abs();
                let prefix = radix.prefix();
                match radix {
                    Radix::Binary => write!(f, "{sign}{prefix}{abs:b}"),
                    Radix::Octal => write!(f, "{sign}{prefix}{abs:o}"),
                    Radix::Decimal => write!(f, "{sign}{abs}"),
                    Radix::Hexadecimal => write!(f, "{sign}{prefix}{abs:x}"),
                }
            }
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}
