//! Per-row classification inside a known table.

use std::sync::Arc;

use serde::Serialize;

use super::table::TableKind;
use super::variables::{RobotVariableMatcher, VariableMatcher};

/// Visual category of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Style {
    TableHeader,
    SettingName,
    VariableName,
}

/// Highlighted character range `[start, end)` of one line.
///
/// `style == None` always comes with the empty `[0, 0)` span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub start: usize,
    pub end: usize,
    pub style: Option<Style>,
}

impl ClassificationResult {
    /// No highlighting.
    pub const NONE: ClassificationResult = ClassificationResult { start: 0, end: 0, style: None };

    pub fn span(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style: Some(style) }
    }

    /// A styled but empty span; the row kind is known but nothing gets highlighted.
    pub fn empty(style: Style) -> Self {
        Self::span(0, 0, style)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classifies a non-header line according to the table it sits in.
#[derive(Clone)]
pub struct RowClassifier {
    variables: Arc<dyn VariableMatcher>,
}

impl RowClassifier {
    pub fn new(variables: Arc<dyn VariableMatcher>) -> Self {
        Self { variables }
    }

    pub fn classify(&self, table: TableKind, line: &str) -> ClassificationResult {
        match table {
            TableKind::Settings => setting_row(line),
            TableKind::Variables => self.variable_row(line),
            TableKind::TestCases | TableKind::Keywords | TableKind::None => {
                ClassificationResult::NONE
            }
        }
    }

    /// The leading token, when it is a variable reference.
    fn variable_row(&self, line: &str) -> ClassificationResult {
        match line.split_whitespace().next() {
            Some(token) if self.variables.is_variable_reference(token) => {
                ClassificationResult::span(0, token.chars().count(), Style::VariableName)
            }
            _ => ClassificationResult::empty(Style::VariableName),
        }
    }
}

/// Everything up to the first space. A line without a space gets no highlight.
fn setting_row(line: &str) -> ClassificationResult {
    match line.chars().position(|c| c == ' ') {
        Some(end) => ClassificationResult::span(0, end, Style::SettingName),
        None => ClassificationResult::empty(Style::SettingName),
    }
}

impl Default for RowClassifier {
    fn default() -> Self {
        Self::new(Arc::new(RobotVariableMatcher))
    }
}

impl std::fmt::Debug for RowClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowClassifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_row_up_to_first_space() {
        let rows = RowClassifier::default();
        let result = rows.classify(TableKind::Settings, "Library    Collections");
        assert_eq!(result, ClassificationResult::span(0, 7, Style::SettingName));
    }

    #[test]
    fn test_setting_row_without_space_is_empty() {
        let rows = RowClassifier::default();
        let result = rows.classify(TableKind::Settings, "Library");
        assert_eq!((result.start, result.end), (0, 0));
        assert_eq!(result.style, Some(Style::SettingName));
    }

    #[test]
    fn test_setting_row_tab_is_not_a_space() {
        let rows = RowClassifier::default();
        let result = rows.classify(TableKind::Settings, "Library\tCollections");
        assert!(result.is_empty());
    }

    #[test]
    fn test_variable_row() {
        let rows = RowClassifier::default();
        assert_eq!(
            rows.classify(TableKind::Variables, "${X}    value"),
            ClassificationResult::span(0, 4, Style::VariableName)
        );
        assert!(rows.classify(TableKind::Variables, "notavar    value").is_empty());
        assert!(rows.classify(TableKind::Variables, "").is_empty());
    }

    #[test]
    fn test_injected_variable_matcher() {
        let rows = RowClassifier::new(Arc::new(|token: &str| token == "notavar"));
        assert_eq!(
            rows.classify(TableKind::Variables, "notavar    value"),
            ClassificationResult::span(0, 7, Style::VariableName)
        );
    }

    #[test]
    fn test_tables_without_row_highlighting() {
        let rows = RowClassifier::default();
        for table in [TableKind::TestCases, TableKind::Keywords, TableKind::None] {
            assert_eq!(rows.classify(table, "Library    Collections"), ClassificationResult::NONE);
        }
    }
}
