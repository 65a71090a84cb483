//! Position tracking for source locations
//!
//! ## Types
//!
//! - [`Position`] - A 1-based line:column position in source text
//! - [`SourceLocation`] - Utility for converting byte offsets to positions
//!
//! Columns count characters, not bytes, so multi-byte UTF-8 input reports the same
//! column an editor would show.

use serde::Serialize;
use std::fmt;

/// Represents a position in source text (line and column, both starting at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Provides fast conversion from byte offsets to line/column positions
pub struct SourceLocation<'a> {
    source: &'a str,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl<'a> SourceLocation<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];

        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }

        Self {
            source,
            line_starts,
        }
    }

    /// Convert a byte offset to a line/column position
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i - 1);

        let line_start = self.line_starts[line];
        let end = byte_offset.min(self.source.len());
        let column = self.source[line_start..end].chars().count();

        Position::new(line + 1, column + 1)
    }

    /// Get the total number of lines in the source
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new(3, 7).to_string(), "3:7");
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 1));
        assert!(Position::new(2, 1) < Position::new(2, 2));
    }

    #[test]
    fn test_byte_to_position() {
        let loc = SourceLocation::new("ab\ncd\n\nef");
        assert_eq!(loc.byte_to_position(0), Position::new(1, 1));
        assert_eq!(loc.byte_to_position(1), Position::new(1, 2));
        assert_eq!(loc.byte_to_position(3), Position::new(2, 1));
        assert_eq!(loc.byte_to_position(6), Position::new(3, 1));
        assert_eq!(loc.byte_to_position(8), Position::new(4, 2));
        assert_eq!(loc.line_count(), 4);
    }

    #[test]
    fn test_columns_count_characters() {
        let loc = SourceLocation::new("αβγ x");
        // 'x' is at byte 7 but is the fifth character
        assert_eq!(loc.byte_to_position(7), Position::new(1, 5));
    }
}
