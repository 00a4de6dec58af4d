//! Source positions, ranges and locations

use derive_more::Display;
use qss_name::ScriptPath;
use serde::{Deserialize, Serialize};

/// A zero-indexed line and character offset in a script
///
/// Displayed one-indexed, the way editors show it.
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display,
)]
#[display("{}:{}", line + 1, character + 1)]
pub struct Position {
    /// Zero-indexed line
    pub line: u32,
    /// Zero-indexed character within the line
    pub character: u32,
}

impl Position {
    /// Create a position
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open range of positions in a script
#[derive(
    Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Display,
)]
#[display("{start}-{end}")]
pub struct Range {
    /// First position covered
    pub start: Position,
    /// Position just past the end
    pub end: Position,
}

impl Range {
    /// Create a range between two positions
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range at a single position
    #[must_use]
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// A range covering whole lines, `first` to `last` inclusive (zero-indexed)
    #[must_use]
    pub fn lines(first: u32, last: u32) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, u32::MAX),
        }
    }

    /// The range from the start of `first` to the end of `last`
    #[must_use]
    pub fn combine(first: Self, last: Self) -> Self {
        Self {
            start: first.start,
            end: last.end,
        }
    }

    /// Whether `position` lies inside this range
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// One-indexed `first-last` line span, as used in diagnostics
    #[must_use]
    pub fn line_span(&self) -> String {
        format!("{}-{}", self.start.line + 1, self.end.line + 1)
    }
}

/// A range within a particular script
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize, Display)]
#[display("{path}:{}", range.start)]
pub struct Location {
    /// Script the range belongs to
    pub path: ScriptPath,
    /// Range within the script
    pub range: Range,
}

impl Location {
    /// Create a location
    #[must_use]
    pub fn new(path: ScriptPath, range: Range) -> Self {
        Self { path, range }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_displays_one_indexed() {
        assert_eq!(Position::new(0, 4).to_string(), "1:5");
    }

    #[test]
    fn test_combine_spans_both_ranges() {
        let first = Range::new(Position::new(1, 2), Position::new(1, 5));
        let last = Range::new(Position::new(3, 0), Position::new(4, 1));
        let combined = Range::combine(first, last);
        assert_eq!(combined.start, first.start);
        assert_eq!(combined.end, last.end);
        assert_eq!(combined.line_span(), "2-5");
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = Range::new(Position::new(0, 0), Position::new(0, 3));
        assert!(range.contains(Position::new(0, 0)));
        assert!(range.contains(Position::new(0, 2)));
        assert!(!range.contains(Position::new(0, 3)));
    }

    #[test]
    fn test_location_display() {
        let location = Location::new(
            ScriptPath::parse("src/a/b.qss"),
            Range::point(Position::new(9, 0)),
        );
        assert_eq!(location.to_string(), "src/a/b.qss:10:1");
    }
}
