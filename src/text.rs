//! Line geometry of a text buffer.

use crate::types::Position;

/// Character length of every line in a buffer. Lines are split on `\n`,
/// with a trailing `\r` dropped, so text ending in a newline has a final
/// empty line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Length of each line in characters, terminator excluded. Never empty.
    lengths: Vec<u32>,
}

impl LineIndex {
    /// Position just past the last character of the buffer.
    pub fn end(&self) -> Position {
        let last = self.last_line();
        return self.line_end(last);
    }

    /// Number of the final line.
    fn last_line(&self) -> u32 {
        let count = u32::try_from(self.lengths.len()).unwrap_or(u32::MAX);
        return count.saturating_sub(1);
    }

    /// End position of `line`, clamped to the last line of the buffer.
    pub fn line_end(&self, line: u32) -> Position {
        let line = line.min(self.last_line());
        let len = usize::try_from(line)
            .ok()
            .and_then(|idx| return self.lengths.get(idx).copied())
            .unwrap_or(0);
        return Position::new(line, len);
    }

    /// Build the index for `text`.
    pub fn new(text: &str) -> Self {
        let lengths = text
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                return u32::try_from(line.chars().count()).unwrap_or(u32::MAX);
            })
            .collect();
        return Self { lengths };
    }

    /// The position immediately before `pos`: one character earlier on the
    /// same line, or the end of the previous line at character 0. The start
    /// of the document maps to itself.
    pub fn position_before(&self, pos: Position) -> Position {
        if pos.character > 0 {
            return Position::new(pos.line, pos.character.saturating_sub(1));
        }
        if pos.line == 0 {
            return Position::new(0, 0);
        }
        return self.line_end(pos.line.saturating_sub(1));
    }
}
