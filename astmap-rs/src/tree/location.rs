//! Source locations and location keys.

use std::fmt;

/// A character range in a source file, as reported by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRange {
    /// Offset of the first character.
    pub pos: usize,
    /// Number of characters covered.
    pub length: usize,
}

impl SourceRange {
    /// Creates a range starting at `pos` covering `length` characters.
    pub fn new(pos: usize, length: usize) -> Self {
        SourceRange { pos, length }
    }

    /// Offset one past the last character.
    pub fn end(&self) -> usize {
        self.pos + self.length
    }

    /// Returns true if `other` lies within this range.
    pub fn encloses(&self, other: &SourceRange) -> bool {
        self.pos <= other.pos && other.end() <= self.end()
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.pos, self.end())
    }
}

/// A (file path, source range) pair locating a node by its original position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    /// Path of the file the range belongs to.
    pub file: String,
    /// Range of the construct.
    pub range: SourceRange,
}

impl LocationKey {
    /// Creates a location key.
    pub fn new(file: impl Into<String>, pos: usize, length: usize) -> Self {
        LocationKey {
            file: file.into(),
            range: SourceRange::new(pos, length),
        }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file, self.range)
    }
}
