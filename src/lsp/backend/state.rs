//! Backend state
//!
//! Everything the handlers share lives behind `Arc`s so the backend can be
//! cloned into background tasks. Locks here are `parking_lot` locks and are
//! never held across an `.await`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tower_lsp::Client;

use crate::completion::CompletionEngine;
use crate::config::ServerConfig;
use crate::lsp::document::DocumentVersions;
use crate::session::SessionRegistry;

/// The test data language server backend.
#[derive(Clone)]
pub struct RobotBackend {
    pub(super) client: Client,
    pub(super) config: Arc<RwLock<ServerConfig>>,
    pub(super) sessions: Arc<Mutex<SessionRegistry>>,
    pub(super) versions: Arc<DocumentVersions>,
    pub(super) completion: CompletionEngine,
    pub(super) root_dir: Arc<RwLock<Option<PathBuf>>>,
    /// Test data files found below the root at initialization.
    pub(super) workspace_files: Arc<RwLock<Vec<PathBuf>>>,
    pub(super) autosave_running: Arc<AtomicBool>,
    pub(super) shutdown_tx: Arc<broadcast::Sender<()>>,
}

impl std::fmt::Debug for RobotBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotBackend")
            .field("config", &*self.config.read())
            .field("open_sessions", &self.sessions.lock().len())
            .field("root_dir", &*self.root_dir.read())
            .finish()
    }
}
