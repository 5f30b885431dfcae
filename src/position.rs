//! Character-based positions and edits shared by the classifier, completion and sessions.
//!
//! Columns count `char`s, not bytes, which is also how the rope buffer in
//! [`crate::session::EditSession`] indexes text.

use serde::Serialize;

/// Zero-based line/column position inside a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Returns the position `columns` characters to the right on the same line.
    pub fn shifted(self, columns: usize) -> Self {
        Self { line: self.line, column: self.column + columns }
    }
}

/// Replacement of the character range `[start, end)` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub start: Position,
    pub end: Position,
    pub new_text: String,
}

impl TextEdit {
    /// Pure insertion at `at`.
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self { start: at, end: at, new_text: text.into() }
    }

    pub fn replace(start: Position, end: Position, text: impl Into<String>) -> Self {
        Self { start, end, new_text: text.into() }
    }

    pub fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    /// Where the caret sits once the edit has been applied: directly after the
    /// inserted text.
    pub fn cursor_after(&self) -> Position {
        match self.new_text.rfind('\n') {
            Some(idx) => Position {
                line: self.start.line + self.new_text.matches('\n').count(),
                column: self.new_text[idx + 1..].chars().count(),
            },
            None => self.start.shifted(self.new_text.chars().count()),
        }
    }
}

/// Converts a byte offset inside `line` to a character offset.
pub fn char_offset(line: &str, byte_offset: usize) -> usize {
    line[..byte_offset.min(line.len())].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_after_single_line_insert() {
        let edit = TextEdit::insert(Position::new(3, 3), "rary");
        assert_eq!(edit.cursor_after(), Position::new(3, 7));
        assert!(edit.is_insertion());
    }

    #[test]
    fn test_cursor_after_multiline_insert() {
        let edit = TextEdit::insert(Position::new(1, 5), "ab\ncde");
        assert_eq!(edit.cursor_after(), Position::new(2, 3));
    }

    #[test]
    fn test_char_offset_counts_multibyte_chars() {
        let line = "äö Library";
        assert_eq!(char_offset(line, "äö".len()), 2);
        assert_eq!(char_offset(line, 1000), line.chars().count());
    }
}
