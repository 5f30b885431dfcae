//! Word-under-cursor detection.

use crate::position::Position;

/// The word being completed and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionQuery {
    pub prefix: String,
    pub anchor: Position,
}

impl CompletionQuery {
    pub fn new(prefix: impl Into<String>, anchor: Position) -> Self {
        Self { prefix: prefix.into(), anchor }
    }

    /// End of the typed prefix, where completions are inserted.
    pub fn cursor(&self) -> Position {
        self.anchor.shifted(self.prefix.chars().count())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Builds the query for a caret at `position` on `line`.
///
/// The word touching the caret is expanded in both directions. With no word
/// at the caret the prefix is empty and anchored at the caret.
pub fn query_at(line: &str, position: Position) -> CompletionQuery {
    let chars: Vec<char> = line.chars().collect();
    let caret = position.column.min(chars.len());

    let start = chars[..caret]
        .iter()
        .rposition(|&c| !is_word_char(c))
        .map_or(0, |i| i + 1);
    let end = chars[caret..]
        .iter()
        .position(|&c| !is_word_char(c))
        .map_or(chars.len(), |i| caret + i);

    CompletionQuery {
        prefix: chars[start..end].iter().collect(),
        anchor: Position::new(position.line, start),
    }
}

/// Span of the first cell of `line`: everything before the first tab or
/// run of two spaces.
fn first_cell_len(chars: &[char]) -> usize {
    chars
        .iter()
        .enumerate()
        .position(|(i, &c)| c == '\t' || (c == ' ' && chars.get(i + 1) == Some(&' ')))
        .unwrap_or(chars.len())
}

/// Text a lookup at `position` refers to.
///
/// Inside the first cell that is the whole cell, so multi-word setting names
/// like `Suite Setup` are found. Elsewhere it is the word touching the caret.
pub fn lookup_at(line: &str, position: Position) -> CompletionQuery {
    let chars: Vec<char> = line.chars().collect();
    let cell = first_cell_len(&chars);
    if cell > 0 && position.column <= cell {
        return CompletionQuery::new(chars[..cell].iter().collect::<String>(), Position::new(position.line, 0));
    }
    query_at(line, position)
}
