//! Server configuration.
//!
//! Values are layered: built-in defaults, then command line flags, then the
//! `ROBOT_DATA_EDITOR_AUTOSAVE_MS` environment variable, then the LSP
//! client's `initializationOptions`. Later layers win.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::session::navigator::DEFAULT_EXTENSIONS;

pub const AUTOSAVE_ENV: &str = "ROBOT_DATA_EDITOR_AUTOSAVE_MS";
pub const DEFAULT_AUTOSAVE_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Autosave period for the active session. 0 disables autosave.
    pub autosave_interval_ms: u64,
    /// File extensions listed by the navigator, without the dot.
    pub extensions: Vec<String>,
    /// Offer setting names outside the Settings table too.
    pub completion_in_any_table: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            autosave_interval_ms: DEFAULT_AUTOSAVE_MS,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            completion_in_any_table: false,
        }
    }
}

/// Partial configuration as sent in `initializationOptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOverrides {
    autosave_interval_ms: Option<u64>,
    extensions: Option<Vec<String>>,
    completion_in_any_table: Option<bool>,
}

impl ServerConfig {
    /// Defaults overridden by the environment.
    pub fn from_env_or_default() -> Self {
        Self::default().with_env()
    }

    /// Applies `ROBOT_DATA_EDITOR_AUTOSAVE_MS` if set. Unparsable values are ignored.
    pub fn with_env(self) -> Self {
        self.with_autosave_var(std::env::var(AUTOSAVE_ENV).ok().as_deref())
    }

    fn with_autosave_var(mut self, value: Option<&str>) -> Self {
        if let Some(raw) = value {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.autosave_interval_ms = ms,
                Err(e) => warn!("Ignoring {}={:?}: {}", AUTOSAVE_ENV, raw, e),
            }
        }
        self
    }

    /// Merges the client's `initializationOptions`. Unknown keys are ignored and
    /// a malformed object leaves the configuration unchanged.
    pub fn merge_init_options(&mut self, options: Option<&Value>) {
        let Some(options) = options else {
            return;
        };
        let overrides: ConfigOverrides = match serde_json::from_value(options.clone()) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Ignoring malformed initializationOptions: {}", e);
                return;
            }
        };
        if let Some(ms) = overrides.autosave_interval_ms {
            self.autosave_interval_ms = ms;
        }
        if let Some(extensions) = overrides.extensions {
            self.extensions = extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect();
        }
        if let Some(any_table) = overrides.completion_in_any_table {
            self.completion_in_any_table = any_table;
        }
    }

    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_ms > 0).then(|| Duration::from_millis(self.autosave_interval_ms))
    }
}
