//! Error types for rvt2-analyzer.
//!
//! This module defines the error taxonomy using `thiserror` for structured error
//! handling.
//!
//! # Error Hierarchy
//!
//! - [`ClientError`] - A backend request failed (transport or application level)
//! - [`ValidationError`] - A store operation was rejected before any request was sent
//! - [`AppError`] - Top-level CLI error wrapping the fatal, non-notification failures
//!
//! # Error Recovery Strategy
//!
//! Client and validation errors are **non-fatal**: the stores turn them into error
//! notifications on the message bus and return normally. Nothing is retried; the analyst
//! re-triggers the operation. Only startup failures (config, logging, state file) and
//! local I/O surface as [`AppError`].

use crate::config::persisted::StateFileError;
use crate::config::ConfigError;
use crate::files::FilesError;
use crate::logging::LoggingError;
use crate::model::identifiers::InvalidIndexName;
use crate::model::query::UnknownQueryType;
use thiserror::Error;

/// A request to the search backend or the file daemon failed.
///
/// Callers never branch on the variant: every failure is reported through
/// [`ClientError::reason`]. The variants exist for logging and tests.
///
/// # Examples
///
/// ```
/// use rvt2_analyzer::model::error::ClientError;
///
/// let err = ClientError::Transport { reason: "connection refused".to_string() };
/// assert_eq!(err.reason(), "Rejected. Wrong server?: connection refused");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never reached the server (DNS, refused connection, TLS...).
    #[error("Rejected. Wrong server?: {reason}")]
    Transport {
        /// Description from the HTTP stack.
        reason: String,
    },

    /// The server answered with a non-success status.
    ///
    /// For ElasticSearch errors `reason` is `error.root_cause[0].reason`; otherwise it is
    /// the raw response body.
    #[error("{reason}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Extracted reason.
        reason: String,
    },

    /// The server answered successfully but the body was not what the caller expected.
    #[error("Unexpected response from server: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// Human-readable reason shown to the analyst.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::UnexpectedResponse(err.to_string())
    }
}

/// A store operation was rejected locally. No request was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Bulk tagging needs exactly one tag.
    #[error("The list must have exactly one tag")]
    TagCount {
        /// How many tags were supplied.
        found: usize,
    },

    /// The referenced result does not exist in the current page.
    #[error("No result at position {idx} (the page has {len} results)")]
    NoSuchResult {
        /// Requested position.
        idx: usize,
        /// Size of the current page.
        len: usize,
    },

    /// New metadata records are keyed by their `name` field.
    #[error("You must define a name in the metadata")]
    MissingName,

    /// No index is selected.
    #[error("The indice's name is null.")]
    NoIndex,
}

/// Top-level error for the command-line front end.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The persisted client state could not be read or written.
    #[error("Client state error: {0}")]
    StateFile(#[from] StateFileError),

    /// Logging could not be initialized.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// The file daemon failed.
    #[error("File daemon error: {0}")]
    Files(#[from] FilesError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] ClientError),

    /// A command-line argument named an invalid index.
    #[error("{0}")]
    InvalidIndex(#[from] InvalidIndexName),

    /// A command-line argument named an unknown query type.
    #[error("{0}")]
    QueryType(#[from] UnknownQueryType),

    /// A command-line argument was malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
