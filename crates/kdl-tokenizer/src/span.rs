//! Byte ranges into the source.

use std::fmt;
use std::ops::Range;

/// A half-open byte range `start..end` into the parsed input.
///
/// Offsets are `u32`: inputs of 4 GiB or more are rejected before
/// tokenizing, so every offset fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "facet", derive(facet::Facet))]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span {start}..{end} is reversed");
        Self { start, end }
    }

    /// A zero-width span, used for errors at a position rather than over text.
    #[inline]
    pub fn empty(at: u32) -> Self {
        Self::new(at, at)
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the span.
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// The text this span covers.
    ///
    /// Panics if the span is out of bounds or splits a character, like
    /// slicing does.
    #[inline]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[Range::<usize>::from(*self)]
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start as usize..span.end as usize
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
