use std::path::PathBuf;

use thiserror::Error;

use crate::object::{Id, ParseIdError};

/// Describes the potential error conditions that might arise while
/// mirroring a remote tree into a local object store.
#[derive(Debug, Error)]
pub enum Error {
    /// The content received for an object does not hash to the ID the
    /// remote advertised for it.
    #[error("bad digest for object {path}: {expected} != {actual}")]
    DigestMismatch {
        path: String,
        expected: Id,
        actual: Id,
    },

    #[error("invalid mode `{mode}` for {path}")]
    InvalidMode { path: String, mode: String },

    #[error("invalid object ID for {path}: {source}")]
    InvalidId {
        path: String,
        #[source]
        source: ParseIdError,
    },

    #[error("invalid entry name `{name}` for {path}")]
    InvalidName { path: String, name: String },

    #[error("duplicate entry `{name}` in {path}")]
    DuplicateEntry { path: String, name: String },

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("unable to parse tree listing from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no X-Next-Page header")]
    MissingPageCursor { url: String },

    #[error("unable to set up HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("work dir doesn't exist: {}", .0.display())]
    WorkDirDoesntExist(PathBuf),

    #[error("git dir doesn't exist: {}", .0.display())]
    GitDirDoesntExist(PathBuf),

    #[error("git dir already exists: {}", .0.display())]
    GitDirShouldntExist(PathBuf),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Returns true if repeating the same request might succeed.
    ///
    /// Only network-level failures, rate limiting and server errors qualify.
    /// Integrity and parse failures are deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A specialized `Result` type for treemirror operations.
pub type Result<T> = std::result::Result<T, Error>;
