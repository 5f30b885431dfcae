//! File tree listing below a root directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const DEFAULT_EXTENSIONS: &[&str] = &["robot", "txt", "tsv", "resource"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigatorEntry {
    pub path: PathBuf,
    pub name: String,
    pub is_file: bool,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    root: PathBuf,
    extensions: Vec<String>,
}

impl Navigator {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|ext| ext.to_ascii_lowercase()).collect(),
        }
    }

    pub fn with_default_extensions(root: impl Into<PathBuf>) -> Self {
        let extensions: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect();
        Self::new(root, &extensions)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` has one of the test data extensions (case-insensitive).
    pub fn is_test_data(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
    }

    /// Directories and test data files below the root, sorted by path.
    /// Unreadable entries are skipped.
    pub fn entries(&self) -> Vec<NavigatorEntry> {
        let mut entries: Vec<NavigatorEntry> = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry below {}: {}", self.root.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir() || self.is_test_data(entry.path()))
            .map(|entry| NavigatorEntry {
                name: name(entry.path()),
                is_file: entry.file_type().is_file(),
                path: entry.into_path(),
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Listed {} entries below {}", entries.len(), self.root.display());
        entries
    }

    /// Only the test data files.
    pub fn files(&self) -> Vec<PathBuf> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.is_file)
            .map(|entry| entry.path)
            .collect()
    }
}

pub fn is_file(path: &Path) -> bool {
    path.is_file()
}

/// Last path component, or the whole path when there is none.
pub fn name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
