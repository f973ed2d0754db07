/// Coordinate types shared by the compiler boundary and the outline.
use serde::{Deserialize, Serialize};

/// A span as reported by the compiler, in 1-based coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    /// Position just past the last character of the element.
    pub end: Point,
    /// Position of the first character of the element.
    pub start: Point,
}

impl Location {
    /// Convert to a 0-based range.
    pub const fn to_range(self) -> Range {
        return Range {
            end: self.end.to_position(),
            start: self.start.to_position(),
        };
    }
}

/// A compiler coordinate. Both parts are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Point {
    /// One-based column.
    pub column: u32,
    /// One-based line number.
    pub line: u32,
}

impl Point {
    /// Convert to a 0-based position. A zero coordinate stays at zero.
    pub const fn to_position(self) -> Position {
        return Position {
            character: self.column.saturating_sub(1),
            line: self.line.saturating_sub(1),
        };
    }
}

/// A 0-based text position. Ordered by line, then character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Position {
    /// Zero-based character offset within the line.
    pub character: u32,
    /// Zero-based line number.
    pub line: u32,
}

impl Ord for Position {
    /// Compare by (line, character), not by field order.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        return (self.line, self.character).cmp(&(other.line, other.character));
    }
}

impl PartialOrd for Position {
    /// Delegate to `Ord` implementation.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        return Some(self.cmp(other));
    }
}

impl Position {
    /// Shorthand constructor.
    pub const fn new(line: u32, character: u32) -> Self {
        return Self { character, line };
    }
}

/// A 0-based span from `start` to `end`, both inclusive positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Range {
    /// Last position covered by the span.
    pub end: Position,
    /// First position covered by the span.
    pub start: Position,
}

impl Range {
    /// True if `other` lies entirely within this range.
    #[cfg(test)]
    pub fn contains_range(&self, other: &Self) -> bool {
        return self.start <= other.start && other.end <= self.end;
    }

    /// Zero-width range at `pos`.
    pub const fn empty_at(pos: Position) -> Self {
        return Self { end: pos, start: pos };
    }
}

impl std::fmt::Display for Range {
    /// Render as `L:C-L:C`, 1-based for humans.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(
            f,
            "{}:{}-{}:{}",
            self.start.line.saturating_add(1),
            self.start.character.saturating_add(1),
            self.end.line.saturating_add(1),
            self.end.character.saturating_add(1),
        );
    }
}
