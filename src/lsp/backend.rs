use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use parking_lot::{Mutex, RwLock};
use tokio::time::{MissedTickBehavior, interval};
use tower_lsp::Client;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{debug, info, warn};

use crate::completion::CompletionEngine;
use crate::config::ServerConfig;
use crate::data::DocumentClassifier;
use crate::lsp::document::DocumentVersions;
use crate::session::{FileStore, FsFileStore, Navigator, PersistenceError, SessionRegistry};

mod handlers;
mod state;
mod utils;

pub use state::RobotBackend;

impl RobotBackend {
    /// Creates a backend that persists sessions on the local file system.
    pub fn new(client: Client, config: ServerConfig) -> Self {
        Self::with_store(client, config, Arc::new(FsFileStore))
    }

    pub fn with_store(client: Client, config: ServerConfig, store: Arc<dyn FileStore>) -> Self {
        info!("Creating backend with {:?}", config);
        let classifier = Arc::new(DocumentClassifier::default());
        let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        Self {
            client,
            config: Arc::new(RwLock::new(config)),
            sessions: Arc::new(Mutex::new(SessionRegistry::new(store, classifier))),
            versions: Arc::new(DocumentVersions::new()),
            completion: CompletionEngine::new(),
            root_dir: Arc::new(RwLock::new(None)),
            workspace_files: Arc::new(RwLock::new(Vec::new())),
            autosave_running: Arc::new(Default::default()),
            shutdown_tx: Arc::new(shutdown_tx),
        }
    }

    pub fn config(&self) -> ServerConfig {
        self.config.read().clone()
    }

    pub fn root_dir(&self) -> Option<PathBuf> {
        self.root_dir.read().clone()
    }

    pub fn workspace_files(&self) -> Vec<PathBuf> {
        self.workspace_files.read().clone()
    }

    /// Runs `f` with the session registry locked. `f` must not block.
    pub fn with_sessions<R>(&self, f: impl FnOnce(&mut SessionRegistry) -> R) -> R {
        f(&mut self.sessions.lock())
    }

    /// Saves the active session if dirty; failures are reported to the client.
    pub async fn autosave_tick(&self) -> Option<PathBuf> {
        let result = self.sessions.lock().autosave_tick();
        match result {
            Ok(saved) => saved,
            Err(e) => {
                self.report_persistence_error(&e).await;
                None
            }
        }
    }

    /// Scans the root for test data files and remembers them.
    pub(super) fn index_workspace(&self, root: &Path) -> usize {
        let extensions = self.config.read().extensions.clone();
        let files = Navigator::new(root, &extensions).files();
        let count = files.len();
        *self.workspace_files.write() = files;
        count
    }

    pub(super) async fn report_persistence_error(&self, error: &PersistenceError) {
        warn!("{}", error);
        self.client.show_message(MessageType::WARNING, error.to_string()).await;
    }

    /// Starts the autosave loop unless it is disabled or already running.
    /// The loop ends on the shutdown signal.
    pub(super) fn spawn_autosave(&self) {
        let Some(period) = self.config.read().autosave_interval() else {
            info!("Autosave disabled");
            return;
        };
        if self.autosave_running.swap(true, Ordering::SeqCst) {
            return;
        }

        let backend = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Autosave every {:?}", period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Some(path) = backend.autosave_tick().await {
                            debug!("Autosaved {}", path.display());
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Autosave received shutdown signal, exiting gracefully");
                        break;
                    }
                }
            }
            backend.autosave_running.store(false, Ordering::SeqCst);
            debug!("Autosave task terminated");
        });
    }
}

/// Session key for a document URI. Only `file:` URIs have one.
pub(super) fn path_of(uri: &Url) -> Option<PathBuf> {
    match uri.to_file_path() {
        Ok(path) => Some(path),
        Err(()) => {
            warn!("Ignoring non-file document {}", uri);
            None
        }
    }
}
