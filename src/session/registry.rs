//! Tracking of open sessions.
//!
//! At most one session per path is open. One of them may be active; it is the
//! only one autosave touches. Switching away from a dirty session or closing
//! it flushes it first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::EditSession;
use super::store::{FileStore, PersistenceError};
use crate::data::DocumentClassifier;

#[derive(Debug)]
pub struct SessionRegistry {
    store: Arc<dyn FileStore>,
    classifier: Arc<DocumentClassifier>,
    sessions: HashMap<PathBuf, EditSession>,
    active: Option<PathBuf>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn FileStore>, classifier: Arc<DocumentClassifier>) -> Self {
        Self { store, classifier, sessions: HashMap::new(), active: None }
    }

    /// Opens `path` from the store, or re-activates it if already open.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<(), PersistenceError> {
        let path = path.into();
        if !self.sessions.contains_key(&path) {
            let session = EditSession::load(path.clone(), self.store.as_ref(), self.classifier.clone())?;
            info!("Opened {}", path.display());
            self.sessions.insert(path.clone(), session);
        }
        self.activate(&path).map(|_| ())
    }

    /// Opens `path` with text supplied by a client, or re-activates it if
    /// already open. An already open session keeps its own text.
    pub fn open_with_text(
        &mut self,
        path: impl Into<PathBuf>,
        text: &str,
    ) -> Result<(), PersistenceError> {
        let path = path.into();
        if !self.sessions.contains_key(&path) {
            let session = EditSession::from_text(path.clone(), text, self.classifier.clone());
            info!("Opened {} from client text", path.display());
            self.sessions.insert(path.clone(), session);
        }
        self.activate(&path).map(|_| ())
    }

    /// Makes `path` the active session, saving the previously active one if dirty.
    ///
    /// Returns `Ok(false)` when `path` is not open. If flushing the previous
    /// session fails, `path` becomes active anyway and the error is returned.
    pub fn activate(&mut self, path: &Path) -> Result<bool, PersistenceError> {
        if !self.sessions.contains_key(path) {
            return Ok(false);
        }
        let previous = self.active.replace(path.to_path_buf());
        match previous {
            Some(previous) if previous.as_path() != path => {
                if let Some(session) = self.sessions.get_mut(&previous) {
                    debug!("Switching from {} to {}", previous.display(), path.display());
                    session.save(self.store.as_ref())?;
                }
            }
            _ => {}
        }
        Ok(true)
    }

    /// Saves `path` if dirty and forgets it. The session is removed even when
    /// the save fails.
    pub fn close(&mut self, path: &Path) -> Result<bool, PersistenceError> {
        let Some(mut session) = self.sessions.remove(path) else {
            return Ok(false);
        };
        if self.active.as_deref() == Some(path) {
            self.active = None;
        }
        info!("Closed {}", path.display());
        session.save(self.store.as_ref())?;
        Ok(true)
    }

    /// Saves the active session if it has unsaved changes.
    pub fn autosave_tick(&mut self) -> Result<Option<PathBuf>, PersistenceError> {
        let Some(active) = self.active.as_ref() else {
            return Ok(None);
        };
        let Some(session) = self.sessions.get_mut(active) else {
            return Ok(None);
        };
        if session.save(self.store.as_ref())? {
            debug!("Autosaved {}", active.display());
            Ok(Some(active.clone()))
        } else {
            Ok(None)
        }
    }

    /// Saves every dirty session and collects the failures.
    pub fn save_all(&mut self) -> Vec<(PathBuf, PersistenceError)> {
        let store = self.store.as_ref();
        let mut failures = Vec::new();
        for (path, session) in self.sessions.iter_mut() {
            if let Err(err) = session.save(store) {
                warn!("Failed to save {}: {}", path.display(), err);
                failures.push((path.clone(), err));
            }
        }
        failures
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.sessions.contains_key(path)
    }

    pub fn open_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.sessions.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.active.as_deref()
    }

    pub fn get(&self, path: &Path) -> Option<&EditSession> {
        self.sessions.get(path)
    }

    pub fn get_mut(&mut self, path: &Path) -> Option<&mut EditSession> {
        self.sessions.get_mut(path)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
