//! Structure recognition for plain-text test data.
//!
//! No grammar is parsed here: headers are found with regular expressions and
//! rows are interpreted through the table they sit in.

pub mod classifier;
pub mod row;
pub mod table;
pub mod variables;

pub use classifier::{DocumentClassifier, HighlightCache, LineClassifier};
pub use row::{ClassificationResult, RowClassifier, Style};
pub use table::{HeaderMatch, TableKind, TableRegistry};
pub use variables::{RobotVariableMatcher, VariableMatcher};

/// Classifies `lines` with the default variable syntax.
pub fn classify_document<I, S>(lines: I) -> Vec<ClassificationResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DocumentClassifier::default().classify_document(lines)
}
