//! Whole-file persistence for edit sessions.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A test data file could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistenceError {
    pub fn path(&self) -> &Path {
        match self {
            PersistenceError::Read { path, .. } | PersistenceError::Write { path, .. } => path,
        }
    }
}

/// Synchronous UTF-8 file access.
pub trait FileStore: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<String, PersistenceError>;

    /// Replaces the file's content with `content`, verbatim.
    fn write(&self, path: &Path, content: &str) -> Result<(), PersistenceError>;
}

/// [`FileStore`] backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileStore;

impl FileStore for FsFileStore {
    fn read(&self, path: &Path) -> Result<String, PersistenceError> {
        fs::read_to_string(path).map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), PersistenceError> {
        fs::write(path, content).map_err(|source| PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suite.robot");
        let content = "*** Settings ***\r\nLibrary    Collections\n\n";

        FsFileStore.write(&path, content).unwrap();
        assert_eq!(FsFileStore.read(&path).unwrap(), content);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.robot");

        let err = FsFileStore.read(&path).unwrap_err();
        assert!(matches!(err, PersistenceError::Read { .. }));
        assert_eq!(err.path(), path.as_path());
        assert!(err.to_string().contains("missing.robot"));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("suite.robot");

        let err = FsFileStore.write(&path, "x").unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }
}
