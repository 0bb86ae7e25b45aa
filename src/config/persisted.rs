//! Persisted client state.
//!
//! A small namespaced key-value file remembering the analyst's last choices (backend
//! URL, analyst name) between runs. Keys are stored as `rvt2-analyzer.<name>`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Namespace prefixed to every key.
pub const NAMESPACE: &str = "rvt2-analyzer";

/// Key of the last-chosen ElasticSearch server.
pub const KEY_ESSERVER: &str = "esserver";

/// Key of the analyst name.
pub const KEY_ANALYST: &str = "analyst";

/// Errors reading or writing the state file.
#[derive(Debug, Error)]
pub enum StateFileError {
    /// The file exists but could not be read.
    #[error("Failed to read client state at {path:?}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a flat TOML table of strings.
    #[error("Invalid client state in {path:?}: {reason}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The file could not be written.
    #[error("Failed to write client state at {path:?}: {source}")]
    Write {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state could not be serialized.
    #[error("Failed to serialize client state: {0}")]
    Serialize(String),
}

/// Namespaced key-value store, optionally backed by a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl LocalStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateFileError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| StateFileError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|e| StateFileError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            BTreeMap::new()
        };
        debug!(path = ?path, keys = values.len(), "Opened client state");
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Value of `name` in the namespace.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&namespaced(name)).map(String::as_str)
    }

    /// Set `name` and write the file through.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), StateFileError> {
        self.values.insert(namespaced(name), value.into());
        self.save()
    }

    fn save(&self) -> Result<(), StateFileError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateFileError::Write {
                path: path.clone(),
                source,
            })?;
        }
        let contents =
            toml::to_string(&self.values).map_err(|e| StateFileError::Serialize(e.to_string()))?;
        std::fs::write(path, contents).map_err(|source| StateFileError::Write {
            path: path.clone(),
            source,
        })
    }
}

fn namespaced(name: &str) -> String {
    format!("{NAMESPACE}.{name}")
}
