//! Parser configuration.

/// Options controlling a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum number of nested children blocks.
    ///
    /// The parser recurses once per block, so this bounds its stack use.
    pub max_depth: usize,
}

impl ParseOptions {
    /// Default limit on nested children blocks.
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum children nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
