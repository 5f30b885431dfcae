//! Document-level classification.
//!
//! Every line's meaning depends on the last table header above it, so the
//! classifier is a left-to-right fold carrying a single [`TableKind`]:
//!
//! ```text
//! (state, line) --header?--> (header table, TableHeader span)
//!               --otherwise--> (state, RowClassifier result)
//! ```
//!
//! [`DocumentClassifier::step`] is that reducer. [`LineClassifier`] wraps it
//! for callers that feed lines one at a time, and [`HighlightCache`] keeps the
//! per-line entry states so an edit can replay from the edited line instead
//! of from the top.

use std::sync::Arc;

use tracing::trace;

use super::row::{ClassificationResult, RowClassifier, Style};
use super::table::{TableKind, TableRegistry};
use super::variables::VariableMatcher;

/// Header recognition followed by row classification.
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    registry: &'static TableRegistry,
    rows: RowClassifier,
}

impl DocumentClassifier {
    pub fn new(rows: RowClassifier) -> Self {
        Self { registry: TableRegistry::global(), rows }
    }

    pub fn with_variable_matcher(variables: Arc<dyn VariableMatcher>) -> Self {
        Self::new(RowClassifier::new(variables))
    }

    /// Classifies one line given the table active above it and returns the
    /// table active after it.
    pub fn step(&self, state: TableKind, line: &str) -> (TableKind, ClassificationResult) {
        match self.registry.match_header(line) {
            Some(header) => (
                header.table,
                ClassificationResult::span(header.start, header.end, Style::TableHeader),
            ),
            None => (state, self.rows.classify(state, line)),
        }
    }

    /// One result per line, in input order, starting from [`TableKind::None`].
    pub fn classify_document<I, S>(&self, lines: I) -> Vec<ClassificationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = TableKind::None;
        lines
            .into_iter()
            .map(|line| {
                let (next, result) = self.step(state, line.as_ref());
                state = next;
                result
            })
            .collect()
    }
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::new(RowClassifier::default())
    }
}

/// Stateful line-by-line driver. Lines must be fed in document order.
#[derive(Debug)]
pub struct LineClassifier<'a> {
    classifier: &'a DocumentClassifier,
    current_table: TableKind,
}

impl<'a> LineClassifier<'a> {
    pub fn new(classifier: &'a DocumentClassifier) -> Self {
        Self { classifier, current_table: TableKind::None }
    }

    pub fn classify_line(&mut self, line: &str) -> ClassificationResult {
        let (next, result) = self.classifier.step(self.current_table, line);
        self.current_table = next;
        result
    }

    pub fn current_table(&self) -> TableKind {
        self.current_table
    }

    /// Starts a new scan from the top of the document.
    pub fn reset(&mut self) {
        self.current_table = TableKind::None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineHighlight {
    /// Table active when the line is reached.
    entry: TableKind,
    /// Table active after the line.
    exit: TableKind,
    result: ClassificationResult,
}

/// Classification results for a whole document with replay support.
#[derive(Debug, Clone, Default)]
pub struct HighlightCache {
    lines: Vec<LineHighlight>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the whole document from scratch.
    pub fn rebuild<I, S>(&mut self, classifier: &DocumentClassifier, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lines.clear();
        self.replay(classifier, TableKind::None, lines);
    }

    /// Drops everything from `first_line` on and replays the remaining lines.
    ///
    /// `lines` must yield the document's lines starting at `first_line`.
    /// Lines above `first_line` are assumed unchanged, so the table active at
    /// `first_line` is taken from the cache.
    pub fn rescan_from<I, S>(&mut self, classifier: &DocumentClassifier, first_line: usize, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let first_line = first_line.min(self.lines.len());
        let entry = self.table_after(first_line);
        self.lines.truncate(first_line);
        trace!("Rescanning highlights from line {} with table {:?}", first_line, entry);
        self.replay(classifier, entry, lines);
    }

    fn replay<I, S>(&mut self, classifier: &DocumentClassifier, mut state: TableKind, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            let (exit, result) = classifier.step(state, line.as_ref());
            self.lines.push(LineHighlight { entry: state, exit, result });
            state = exit;
        }
    }

    /// Table active at the start of `line` (the exit state of the line above).
    fn table_after(&self, line: usize) -> TableKind {
        match line.checked_sub(1).and_then(|prev| self.lines.get(prev)) {
            Some(prev) => prev.exit,
            None => TableKind::None,
        }
    }

    /// Table active for `line`: its exit state if cached, otherwise the last known one.
    pub fn table_at(&self, line: usize) -> TableKind {
        self.lines
            .get(line)
            .or_else(|| self.lines.last())
            .map(|l| l.exit)
            .unwrap_or_default()
    }

    /// Table active when `line` is reached, before the line itself is considered.
    pub fn entry_table(&self, line: usize) -> TableKind {
        self.lines
            .get(line)
            .map(|l| l.entry)
            .unwrap_or_else(|| self.table_at(line))
    }

    pub fn result(&self, line: usize) -> Option<ClassificationResult> {
        self.lines.get(line).map(|l| l.result)
    }

    pub fn results(&self) -> Vec<ClassificationResult> {
        self.lines.iter().map(|l| l.result).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    const DOCUMENT: &str = "*** Settings ***\nLibrary Collections\n*** Variables ***\n${X}  1\nplain text";

    #[test]
    fn test_end_to_end_scenario() {
        let classifier = DocumentClassifier::default();
        let results = classifier.classify_document(DOCUMENT.lines());
        assert_eq!(
            results,
            vec![
                ClassificationResult::span(0, 16, Style::TableHeader),
                ClassificationResult::span(0, 7, Style::SettingName),
                ClassificationResult::span(0, 17, Style::TableHeader),
                ClassificationResult::span(0, 4, Style::VariableName),
                ClassificationResult::empty(Style::VariableName),
            ]
        );
    }

    #[test]
    fn test_lines_before_any_header_are_plain() {
        let classifier = DocumentClassifier::default();
        let results = classifier.classify_document(["Library    Collections", "${X}  1", ""]);
        assert!(results.iter().all(|r| *r == ClassificationResult::NONE));
    }

    #[test]
    fn test_test_case_rows_are_plain() {
        let classifier = DocumentClassifier::default();
        let results = classifier.classify_document(["*** Test Cases ***", "Library    Collections"]);
        assert_eq!(results[1], ClassificationResult::NONE);
    }

    #[test]
    fn test_line_classifier_carries_state_and_resets() {
        let classifier = DocumentClassifier::default();
        let mut lines = LineClassifier::new(&classifier);
        lines.classify_line("*** Variables ***");
        assert_eq!(lines.current_table(), TableKind::Variables);
        assert_eq!(lines.classify_line("${X}  1").end, 4);
        lines.reset();
        assert_eq!(lines.current_table(), TableKind::None);
        assert_eq!(lines.classify_line("${X}  1"), ClassificationResult::NONE);
    }

    #[test]
    fn test_classify_document_is_idempotent() {
        let classifier = DocumentClassifier::default();
        let first = classifier.classify_document(DOCUMENT.lines());
        let second = classifier.classify_document(DOCUMENT.lines());
        assert_eq!(first, second);
    }

    #[test]
    fn test_rescan_after_header_edit_updates_lines_below() {
        let classifier = DocumentClassifier::default();
        let mut cache = HighlightCache::new();
        cache.rebuild(&classifier, DOCUMENT.lines());
        assert_eq!(cache.table_at(1), TableKind::Settings);

        // Turn the first header into a Variables header.
        let edited: Vec<&str> = vec![
            "*** Variables ***",
            "Library Collections",
            "*** Variables ***",
            "${X}  1",
            "plain text",
        ];
        cache.rescan_from(&classifier, 0, edited.iter());
        assert_eq!(cache.table_at(1), TableKind::Variables);
        assert_eq!(cache.result(1), Some(ClassificationResult::empty(Style::VariableName)));
        assert_eq!(cache.results(), classifier.classify_document(edited));
    }

    #[test]
    fn test_entry_and_exit_tables() {
        let classifier = DocumentClassifier::default();
        let mut cache = HighlightCache::new();
        cache.rebuild(&classifier, DOCUMENT.lines());
        assert_eq!(cache.entry_table(0), TableKind::None);
        assert_eq!(cache.table_at(0), TableKind::Settings);
        assert_eq!(cache.entry_table(2), TableKind::Settings);
        assert_eq!(cache.table_at(2), TableKind::Variables);
        assert_eq!(cache.table_at(99), TableKind::Variables);
    }

    fn line_pool() -> Vec<&'static str> {
        vec![
            "*** Settings ***",
            "*Variable*",
            "* test cases *",
            "***Keywords***",
            "Library    Collections",
            "Resource",
            "${X}    1",
            "@{LIST}  a  b",
            "notavar    value",
            "",
            "    Log    hello",
        ]
    }

    #[test]
    fn test_rescan_from_any_line_matches_full_scan() {
        fn prop(indices: Vec<u8>, edited: Vec<u8>, first_line: u8) -> TestResult {
            let pool = line_pool();
            let pick = |i: &u8| pool[*i as usize % pool.len()];
            let original: Vec<&str> = indices.iter().map(pick).collect();
            if original.is_empty() {
                return TestResult::discard();
            }
            let first = first_line as usize % original.len();

            // Keep lines above `first`, replace everything from `first` on.
            let mut document: Vec<&str> = original[..first].to_vec();
            document.extend(edited.iter().map(pick));

            let classifier = DocumentClassifier::default();
            let mut cache = HighlightCache::new();
            cache.rebuild(&classifier, original.iter());
            cache.rescan_from(&classifier, first, document[first..].iter());

            TestResult::from_bool(cache.results() == classifier.classify_document(&document))
        }

        QuickCheck::new()
            .tests(200)
            .quickcheck(prop as fn(Vec<u8>, Vec<u8>, u8) -> TestResult);
    }
}
