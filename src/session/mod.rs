//! Open documents and their lifecycle.
//!
//! An [`EditSession`] owns one document's text, its modification flag and its
//! highlight cache. Sessions become dirty on the first edit after loading or
//! saving, and saving a clean session is a no-op. [`SessionRegistry`] tracks
//! which paths are open and which session is active for autosave.

pub mod navigator;
pub mod registry;
pub mod store;

pub use navigator::{Navigator, NavigatorEntry};
pub use registry::SessionRegistry;
pub use store::{FileStore, FsFileStore, PersistenceError};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ropey::{Rope, RopeSlice};
use tracing::{debug, trace};

use crate::completion::{CompletionQuery, lookup_at, query_at};
use crate::data::{ClassificationResult, DocumentClassifier, HighlightCache, TableKind};
use crate::position::{Position, TextEdit};

/// Text of a rope line without its line terminator.
fn line_text(slice: RopeSlice<'_>) -> String {
    let mut text = slice.to_string();
    while text.ends_with('\n') || text.ends_with('\r') {
        text.pop();
    }
    text
}

/// One open test data document.
#[derive(Debug)]
pub struct EditSession {
    path: PathBuf,
    buffer: Rope,
    is_modified: bool,
    revision: u64,
    classifier: Arc<DocumentClassifier>,
    highlights: HighlightCache,
}

impl EditSession {
    /// Reads `path` through `store` and classifies it.
    pub fn load(
        path: impl Into<PathBuf>,
        store: &dyn FileStore,
        classifier: Arc<DocumentClassifier>,
    ) -> Result<Self, PersistenceError> {
        let path = path.into();
        let text = store.read(&path)?;
        debug!("Loaded {} ({} bytes)", path.display(), text.len());
        Ok(Self::from_text(path, &text, classifier))
    }

    /// Session over text supplied by a client; not considered modified.
    pub fn from_text(path: impl Into<PathBuf>, text: &str, classifier: Arc<DocumentClassifier>) -> Self {
        let mut session = Self {
            path: path.into(),
            buffer: Rope::from_str(text),
            is_modified: false,
            revision: 0,
            classifier,
            highlights: HighlightCache::new(),
        };
        session.rescan_from(0);
        session
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Number of edits applied since the session was created.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Underlying text, for conversions to other column encodings.
    pub fn buffer(&self) -> &Rope {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    /// Text of line `index` without its terminator.
    pub fn line(&self, index: usize) -> Option<String> {
        (index < self.buffer.len_lines()).then(|| line_text(self.buffer.line(index)))
    }

    pub fn highlights(&self) -> &HighlightCache {
        &self.highlights
    }

    pub fn highlight(&self, line: usize) -> Option<ClassificationResult> {
        self.highlights.result(line)
    }

    /// Table in effect when `line` is reached.
    pub fn table_at(&self, line: usize) -> TableKind {
        self.highlights.entry_table(line)
    }

    /// Word under the caret at `position`, for completion.
    pub fn completion_query(&self, position: Position) -> CompletionQuery {
        let line = self.line(position.line).unwrap_or_default();
        query_at(&line, position)
    }

    /// Text under `position` for hover lookups.
    pub fn lookup_query(&self, position: Position) -> CompletionQuery {
        let line = self.line(position.line).unwrap_or_default();
        lookup_at(&line, position)
    }

    /// Char index of `position`, clamped to the end of its line (or of the text).
    pub fn char_index(&self, position: Position) -> usize {
        if position.line >= self.buffer.len_lines() {
            return self.buffer.len_chars();
        }
        let line_start = self.buffer.line_to_char(position.line);
        let line_len = line_text(self.buffer.line(position.line)).chars().count();
        line_start + position.column.min(line_len)
    }

    /// Replaces `[edit.start, edit.end)` with `edit.new_text` and marks the session dirty.
    pub fn apply_edit(&mut self, edit: &TextEdit) {
        let start = self.char_index(edit.start);
        let end = self.char_index(edit.end).max(start);
        self.buffer.remove(start..end);
        self.buffer.insert(start, &edit.new_text);
        self.touch();
        self.rescan_from(edit.start.line.min(edit.end.line));
    }

    /// Replaces the whole text and marks the session dirty.
    pub fn replace_text(&mut self, text: &str) {
        self.buffer = Rope::from_str(text);
        self.touch();
        self.rescan_from(0);
    }

    /// Writes the buffer if it has unsaved changes.
    ///
    /// Returns `Ok(false)` without touching the store when the session is
    /// clean. A failed write keeps the session dirty.
    pub fn save(&mut self, store: &dyn FileStore) -> Result<bool, PersistenceError> {
        if !self.is_modified {
            trace!("Skipping save of unmodified {}", self.path.display());
            return Ok(false);
        }
        store.write(&self.path, &self.buffer.to_string())?;
        self.is_modified = false;
        debug!("Saved {} (revision {})", self.path.display(), self.revision);
        Ok(true)
    }

    /// Records that the current text was persisted by someone else.
    pub fn mark_saved(&mut self) {
        self.is_modified = false;
    }

    fn touch(&mut self) {
        self.is_modified = true;
        self.revision += 1;
    }

    fn rescan_from(&mut self, first_line: usize) {
        let total = self.buffer.len_lines();
        let first = first_line.min(self.highlights.len()).min(total);
        let buffer = &self.buffer;
        self.highlights.rescan_from(
            &self.classifier,
            first,
            (first..total).map(|i| line_text(buffer.line(i))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Style;
    use indoc::indoc;

    const SUITE: &str = indoc! {"
        *** Settings ***
        Library    Collections
        *** Test Cases ***
        Example
            Log    hello
    "};

    fn session(text: &str) -> EditSession {
        EditSession::from_text("/tmp/suite.robot", text, Arc::new(DocumentClassifier::default()))
    }

    #[test]
    fn test_new_session_is_clean_and_classified() {
        let session = session(SUITE);
        assert!(!session.is_modified());
        assert_eq!(session.highlight(0).unwrap().style, Some(Style::TableHeader));
        assert_eq!(session.highlight(1).unwrap(), ClassificationResult::span(0, 7, Style::SettingName));
        assert_eq!(session.table_at(1), TableKind::Settings);
        assert_eq!(session.table_at(3), TableKind::TestCases);
    }

    #[test]
    fn test_edit_marks_dirty_and_updates_text() {
        let mut session = session(SUITE);
        session.apply_edit(&TextEdit::replace(Position::new(1, 0), Position::new(1, 7), "Resource"));
        assert!(session.is_modified());
        assert_eq!(session.revision(), 1);
        assert_eq!(session.line(1).unwrap(), "Resource    Collections");
        assert_eq!(session.highlight(1).unwrap().end, 8);
    }

    #[test]
    fn test_header_edit_reclassifies_following_lines() {
        let mut session = session(SUITE);
        // "*** Test Cases ***" -> "*** Variables ***"
        session.apply_edit(&TextEdit::replace(Position::new(2, 4), Position::new(2, 14), "Variables"));
        assert_eq!(session.line(2).unwrap(), "*** Variables ***");
        assert_eq!(session.table_at(3), TableKind::Variables);

        let lines: Vec<String> = (0..session.line_count()).filter_map(|i| session.line(i)).collect();
        let expected = DocumentClassifier::default().classify_document(&lines);
        assert_eq!(session.highlights().results(), expected);
    }

    #[test]
    fn test_multiline_insert_shifts_lines() {
        let mut session = session(SUITE);
        session.apply_edit(&TextEdit::insert(Position::new(1, 0), "Resource    common.resource\n"));
        assert_eq!(session.line(1).unwrap(), "Resource    common.resource");
        assert_eq!(session.line(2).unwrap(), "Library    Collections");
        assert_eq!(session.highlight(2).unwrap().end, 7);
        assert_eq!(session.highlight(3).unwrap().style, Some(Style::TableHeader));
    }

    #[test]
    fn test_char_index_clamps() {
        let session = session("abc\ndef");
        assert_eq!(session.char_index(Position::new(0, 10)), 3);
        assert_eq!(session.char_index(Position::new(1, 1)), 5);
        assert_eq!(session.char_index(Position::new(9, 0)), 7);
    }

    #[test]
    fn test_completion_query_uses_current_line() {
        let session = session("*** Settings ***\nLib");
        let query = session.completion_query(Position::new(1, 3));
        assert_eq!(query, CompletionQuery::new("Lib", Position::new(1, 0)));
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let session = session("*** Settings ***\r\nLibrary    X\r\n");
        assert_eq!(session.line(1).unwrap(), "Library    X");
        assert_eq!(session.highlight(1).unwrap().end, 7);
    }

    #[test]
    fn test_only_newline_and_carriage_return_break_lines() {
        let session = session("Log    a\u{2028}b\u{000C}c\u{0085}d\nLog    e\rLog    f");
        assert_eq!(session.line_count(), 3);
        assert_eq!(session.line(0).unwrap(), "Log    a\u{2028}b\u{000C}c\u{0085}d");
        assert_eq!(session.line(1).unwrap(), "Log    e");
        assert_eq!(session.line(2).unwrap(), "Log    f");
    }
}
