//! Client of the RVT2 file-serving daemon.
//!
//! The daemon exposes the exported files of every source under
//! `{server}/{casename}/{source}/{path}`: directories answer with a JSON listing, files
//! with their raw bytes.

use crate::client::{backend_reason, join_url, HttpRequest, HttpResponse, Transport, Verb};
use crate::model::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the synthetic parent entry.
pub const PARENT_ENTRY: &str = "..";

/// Entry type of directories.
pub const DIRECTORY_TYPE: &str = "directory";

/// Errors talking to the file daemon.
#[derive(Debug, Error)]
pub enum FilesError {
    /// The request failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The downloaded file could not be written.
    #[error("Failed to write {path:?}: {source}")]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The daemon answered with something that is not the expected JSON.
    #[error("Unexpected answer from the file server: {0}")]
    Json(#[from] serde_json::Error),
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    /// File or directory name.
    pub name: String,
    /// `directory` or `file`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Anything else the daemon reports (size, dates...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl DirEntry {
    /// A directory entry without extra fields.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DIRECTORY_TYPE.to_string(),
            extra: serde_json::Map::new(),
        }
    }

    /// True for directories.
    pub fn is_directory(&self) -> bool {
        self.kind == DIRECTORY_TYPE
    }
}

/// A directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    /// Path of the directory relative to the source root.
    pub dirname: String,
    /// Parent path; `None` at the top.
    #[serde(default)]
    pub parent: Option<String>,
    /// Entries, with [`PARENT_ENTRY`] first when there is a parent.
    pub items: Vec<DirEntry>,
}

/// Files of one source of one case.
#[derive(Debug)]
pub struct FilesClient<T> {
    transport: T,
    server: String,
    casename: String,
    source: String,
}

impl<T: Transport> FilesClient<T> {
    /// Client for the files of `source` in `casename` served at `server`.
    pub fn new(
        transport: T,
        server: impl Into<String>,
        casename: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            server: server.into(),
            casename: casename.into(),
            source: source.into(),
        }
    }

    /// List `dirname`. An empty name lists the source root.
    pub fn get_directory(&self, dirname: &str) -> Result<Directory, FilesError> {
        let url = join_url(&self.source_root(), dirname);
        let response = self.get(url)?;
        let mut directory: Directory = serde_json::from_slice(&response.body)?;
        if directory.parent.is_some() {
            directory.items.insert(0, DirEntry::directory(PARENT_ENTRY));
        }
        debug!(dirname = %directory.dirname, items = directory.items.len(), "Listed directory");
        Ok(directory)
    }

    /// URL of `filename` inside `dirname`.
    pub fn to_server_path(&self, dirname: &str, filename: &str) -> String {
        if dirname.is_empty() {
            join_url(&self.source_root(), filename)
        } else {
            join_url(&self.source_root(), &format!("{dirname}/{filename}"))
        }
    }

    /// Fetch a file and save it to `dest`. Returns the number of bytes written.
    pub fn download_file(&self, dirname: &str, filename: &str, dest: &Path) -> Result<usize, FilesError> {
        let response = self.get(self.to_server_path(dirname, filename))?;
        std::fs::write(dest, &response.body).map_err(|source| FilesError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        info!(file = %filename, dest = ?dest, bytes = response.body.len(), "Downloaded file");
        Ok(response.body.len())
    }

    fn source_root(&self) -> String {
        format!(
            "{}/{}/{}",
            self.server.trim_end_matches('/'),
            self.casename,
            self.source
        )
    }

    fn get(&self, url: String) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest {
            verb: Verb::Get,
            url,
            body: None,
        };
        let response = self.transport.send(&request)?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ClientError::Backend {
                status: response.status,
                reason: backend_reason(&response.body),
            })
        }
    }
}

/// Parse newline-delimited JSON, skipping empty lines.
pub fn parse_json_lines(text: &str) -> Result<Vec<Value>, serde_json::Error> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect()
}
