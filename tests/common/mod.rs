//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use robot_data_editor::session::{FileStore, PersistenceError};

/// In-memory [`FileStore`] that records writes and can be told to fail them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
    writes: Mutex<Vec<PathBuf>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let store = Self::default();
        for (path, text) in files {
            store.files.lock().insert(PathBuf::from(path), text.to_string());
        }
        Arc::new(store)
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().get(Path::new(path)).cloned()
    }

    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String, PersistenceError> {
        self.files.lock().get(path).cloned().ok_or_else(|| PersistenceError::Read {
            path: path.to_path_buf(),
            source: io::Error::from(io::ErrorKind::NotFound),
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), PersistenceError> {
        if *self.fail_writes.lock() {
            return Err(PersistenceError::Write {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        self.writes.lock().push(path.to_path_buf());
        self.files.lock().insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}
