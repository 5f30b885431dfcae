//! Setting-name completion.
//!
//! Candidates come from a fixed vocabulary and are filtered by a
//! case-insensitive prefix. Accepting a candidate inserts only the part the
//! user has not typed yet, at the end of the typed word, so text already on
//! the line is left untouched and the caret ends right after the insertion.

pub mod context;
pub mod vocabulary;

pub use context::{CompletionQuery, lookup_at, query_at};
pub use vocabulary::SettingName;

use tracing::debug;

use crate::position::TextEdit;
use vocabulary::SETTING_NAMES;

/// Prefix filter over the setting-name vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct CompletionEngine {
    vocabulary: &'static [SettingName],
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self { vocabulary: SETTING_NAMES }
    }
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

impl CompletionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocabulary(&self) -> &'static [SettingName] {
        self.vocabulary
    }

    /// Vocabulary entries starting with `prefix`, ignoring case, in vocabulary order.
    pub fn open(&self, prefix: &str) -> Vec<&'static str> {
        let candidates: Vec<&'static str> = self
            .entries(prefix)
            .map(|setting| setting.name)
            .collect();
        debug!("Completion prefix {:?} matched {} setting names", prefix, candidates.len());
        candidates
    }

    /// Like [`CompletionEngine::open`], with descriptions.
    pub fn entries(&self, prefix: &str) -> impl Iterator<Item = &'static SettingName> {
        self.vocabulary
            .iter()
            .filter(move |setting| starts_with_ignore_case(setting.name, prefix))
    }

    /// The vocabulary entry named `name`, ignoring case.
    pub fn describe(&self, name: &str) -> Option<&'static SettingName> {
        let name = name.to_lowercase();
        self.vocabulary
            .iter()
            .find(|setting| setting.name.to_lowercase() == name)
    }

    /// Edit that completes `query.prefix` to `selected`.
    ///
    /// Only the untyped suffix of `selected` is inserted, at the end of the
    /// typed word.
    ///
    /// # Panics
    ///
    /// Panics if `selected` is not one of the candidates `open(&query.prefix)`
    /// returns; the suffix arithmetic is meaningless otherwise.
    pub fn accept(&self, selected: &str, query: &CompletionQuery) -> TextEdit {
        assert!(
            self.open(&query.prefix).iter().any(|candidate| *candidate == selected),
            "{selected:?} is not a completion of {:?}",
            query.prefix
        );
        let typed = query.prefix.chars().count();
        let suffix: String = selected.chars().skip(typed).collect();
        TextEdit::insert(query.cursor(), suffix)
    }
}
