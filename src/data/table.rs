//! Table kinds and the header recognizer.
//!
//! A header line is any line containing asterisks, the table name (singular or
//! with a trailing `s`) and asterisks again, e.g. `*** Settings ***` or
//! `*Setting*`. Matching is case-insensitive and not anchored to the line.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::position::char_offset;

/// The table a line belongs to. `None` until the first header is seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum TableKind {
    #[default]
    None,
    Settings,
    Variables,
    TestCases,
    Keywords,
}

impl TableKind {
    /// Header kinds in the order they are checked.
    pub const HEADERS: [TableKind; 4] = [
        TableKind::Settings,
        TableKind::Variables,
        TableKind::TestCases,
        TableKind::Keywords,
    ];

    /// Singular table name as written in a header, `None` for [`TableKind::None`].
    pub fn singular_name(self) -> Option<&'static str> {
        match self {
            TableKind::None => None,
            TableKind::Settings => Some("Setting"),
            TableKind::Variables => Some("Variable"),
            TableKind::TestCases => Some("Test Case"),
            TableKind::Keywords => Some("Keyword"),
        }
    }
}

/// A recognized header: the table it opens and the character range it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    pub table: TableKind,
    pub start: usize,
    pub end: usize,
}

struct HeaderPattern {
    table: TableKind,
    regex: Regex,
}

impl HeaderPattern {
    fn new(table: TableKind, name: &str) -> Result<Self, regex::Error> {
        let name = regex::escape(name);
        let pattern = format!(r"(?i)\*+\W*(?:{name}|{name}s)\W*\*+");
        Regex::new(&pattern).map(|regex| HeaderPattern { table, regex })
    }

    fn matches(&self, line: &str) -> Option<HeaderMatch> {
        self.regex.find(line).map(|m| HeaderMatch {
            table: self.table,
            start: char_offset(line, m.start()),
            end: char_offset(line, m.end()),
        })
    }
}

/// Header matchers for every table kind, built once per process.
pub struct TableRegistry {
    patterns: Vec<HeaderPattern>,
}

static REGISTRY: Lazy<TableRegistry> = Lazy::new(TableRegistry::build);

impl TableRegistry {
    /// The shared registry.
    pub fn global() -> &'static TableRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        let patterns = TableKind::HEADERS
            .iter()
            .filter_map(|&table| table.singular_name().map(|name| (table, name)))
            .map(|(table, name)| {
                HeaderPattern::new(table, name).expect("failed to create HeaderPattern")
            })
            .collect();
        Self { patterns }
    }

    /// Returns the first header pattern (in [`TableKind::HEADERS`] order) found in `line`.
    pub fn match_header(&self, line: &str) -> Option<HeaderMatch> {
        self.patterns.iter().find_map(|pattern| pattern.matches(line))
    }
}

impl std::fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.patterns.iter().map(|p| (p.table, p.regex.as_str())))
            .finish()
    }
}
