//! Conversions between protocol types and session edits, plus the
//! per-document version gate.

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::{self, TextDocumentContentChangeEvent, Url};
use tracing::{trace, warn};

use crate::position::{Position, TextEdit};
use crate::session::EditSession;

/// Maps a protocol position, whose `character` counts UTF-16 code units, to
/// a char column of `text`. Columns past the end of the line are clamped.
pub fn from_lsp_position(text: &Rope, position: lsp_types::Position) -> Position {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return Position::new(line, position.character as usize);
    }
    let slice = text.line(line);
    let units = (position.character as usize).min(slice.len_utf16_cu());
    Position::new(line, slice.utf16_cu_to_char(units))
}

/// Inverse of [`from_lsp_position`].
pub fn to_lsp_position(text: &Rope, position: Position) -> lsp_types::Position {
    if position.line >= text.len_lines() {
        return lsp_types::Position::new(position.line as u32, position.column as u32);
    }
    let slice = text.line(position.line);
    let column = slice.char_to_utf16_cu(position.column.min(slice.len_chars()));
    lsp_types::Position::new(position.line as u32, column as u32)
}

pub fn to_lsp_text_edit(text: &Rope, edit: &TextEdit) -> lsp_types::TextEdit {
    lsp_types::TextEdit {
        range: lsp_types::Range::new(to_lsp_position(text, edit.start), to_lsp_position(text, edit.end)),
        new_text: edit.new_text.clone(),
    }
}

/// Moves the start of an insertion made further right on the caret's line
/// back to the caret, re-inserting the skipped text. The edit's outcome is
/// unchanged but its range now contains the caret.
pub fn start_at_caret(session: &EditSession, edit: TextEdit, caret: Position) -> TextEdit {
    if !edit.is_insertion() || edit.start.line != caret.line || edit.start.column <= caret.column {
        return edit;
    }
    let line = session.line(caret.line).unwrap_or_default();
    let skipped: String = line
        .chars()
        .skip(caret.column)
        .take(edit.start.column - caret.column)
        .collect();
    TextEdit::replace(caret, edit.start, skipped + &edit.new_text)
}

/// Applies content changes in order. A change without a range replaces the
/// whole text.
pub fn apply_content_changes(session: &mut EditSession, changes: Vec<TextDocumentContentChangeEvent>) {
    for change in changes {
        match change.range {
            Some(range) => {
                let edit = TextEdit::replace(
                    from_lsp_position(session.buffer(), range.start),
                    from_lsp_position(session.buffer(), range.end),
                    change.text,
                );
                session.apply_edit(&edit);
            }
            None => session.replace_text(&change.text),
        }
    }
}

/// Last accepted version per open document.
#[derive(Debug, Default)]
pub struct DocumentVersions {
    versions: DashMap<Url, i32>,
}

impl DocumentVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `version` for `uri` on open, replacing whatever was there.
    pub fn reset(&self, uri: &Url, version: i32) {
        self.versions.insert(uri.clone(), version);
    }

    /// Accepts `version` if it is newer than the last one seen for `uri`.
    pub fn advance(&self, uri: &Url, version: i32) -> bool {
        let mut entry = self.versions.entry(uri.clone()).or_insert(i32::MIN);
        if version <= *entry {
            warn!("Ignoring change to {}: version {} not newer than {}", uri, version, *entry);
            return false;
        }
        trace!("{} advanced to version {}", uri, version);
        *entry = version;
        true
    }

    pub fn get(&self, uri: &Url) -> Option<i32> {
        self.versions.get(uri).map(|version| *version)
    }

    pub fn remove(&self, uri: &Url) {
        self.versions.remove(uri);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DocumentClassifier;
    use std::sync::Arc;
    use tower_lsp::lsp_types::Range;

    fn session(text: &str) -> EditSession {
        EditSession::from_text("/tmp/test.robot", text, Arc::new(DocumentClassifier::default()))
    }

    #[test]
    fn test_apply_incremental_change() {
        let mut session = session("hello world");
        apply_content_changes(
            &mut session,
            vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(lsp_types::Position::new(0, 6), lsp_types::Position::new(0, 11))),
                range_length: None,
                text: "there".to_string(),
            }],
        );
        assert_eq!(session.text(), "hello there");
        assert!(session.is_modified());
    }

    #[test]
    fn test_apply_full_change_then_incremental() {
        let mut session = session("initial text");
        apply_content_changes(
            &mut session,
            vec![
                TextDocumentContentChangeEvent { range: None, range_length: None, text: "*** Settings ***\n".into() },
                TextDocumentContentChangeEvent {
                    range: Some(Range::new(lsp_types::Position::new(1, 0), lsp_types::Position::new(1, 0))),
                    range_length: None,
                    text: "Library    X".into(),
                },
            ],
        );
        assert_eq!(session.text(), "*** Settings ***\nLibrary    X");
        assert_eq!(session.highlight(1).unwrap().end, 7);
    }

    #[test]
    fn test_versions_must_increase() {
        let versions = DocumentVersions::new();
        let uri = Url::parse("file:///tmp/a.robot").unwrap();
        versions.reset(&uri, 3);
        assert!(!versions.advance(&uri, 3));
        assert!(!versions.advance(&uri, 2));
        assert!(versions.advance(&uri, 4));
        assert_eq!(versions.get(&uri), Some(4));
        versions.remove(&uri);
        assert_eq!(versions.get(&uri), None);
    }

    #[test]
    fn test_text_edit_conversion() {
        let text = Rope::from_str("*** Settings ***\n\nLib\n");
        let edit = TextEdit::insert(Position::new(2, 3), "rary");
        let lsp = to_lsp_text_edit(&text, &edit);
        assert_eq!(lsp.range.start, lsp_types::Position::new(2, 3));
        assert_eq!(lsp.range.end, lsp_types::Position::new(2, 3));
        assert_eq!(lsp.new_text, "rary");
    }

    #[test]
    fn test_utf16_columns_around_astral_chars() {
        let text = Rope::from_str("Log    \u{1F600}abc\nx");
        // The emoji is one char but two UTF-16 code units.
        assert_eq!(from_lsp_position(&text, lsp_types::Position::new(0, 9)), Position::new(0, 8));
        assert_eq!(from_lsp_position(&text, lsp_types::Position::new(0, 10)), Position::new(0, 9));
        assert_eq!(to_lsp_position(&text, Position::new(0, 9)), lsp_types::Position::new(0, 10));
        assert_eq!(from_lsp_position(&text, lsp_types::Position::new(1, 40)), Position::new(1, 1));
        assert_eq!(from_lsp_position(&text, lsp_types::Position::new(5, 2)), Position::new(5, 2));
    }

    #[test]
    fn test_incremental_change_after_astral_char() {
        let mut session = session("Log    \u{1F600}abc\n");
        apply_content_changes(
            &mut session,
            vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(lsp_types::Position::new(0, 10), lsp_types::Position::new(0, 10))),
                range_length: None,
                text: "Z".to_string(),
            }],
        );
        assert_eq!(session.text(), "Log    \u{1F600}aZbc\n");
    }

    #[test]
    fn test_start_at_caret_inside_word() {
        let session = session("Suite Se    x");
        let edit = TextEdit::insert(Position::new(0, 8), "tup");
        let moved = start_at_caret(&session, edit.clone(), Position::new(0, 7));
        assert_eq!(moved, TextEdit::replace(Position::new(0, 7), Position::new(0, 8), "etup"));
        assert_eq!(start_at_caret(&session, edit.clone(), Position::new(0, 8)), edit);
    }
}
