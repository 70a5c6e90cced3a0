//! Error types shared by the capability traits, the collector and the components.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a repository capability (search, management, access, index).
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The request never produced a response (connection, timeout, TLS, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The repository answered with a non-success status.
    #[error("repository returned HTTP {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The response could not be interpreted.
    #[error("malformed repository response: {0}")]
    Malformed(String),

    /// A search session token was rejected by a resume call.
    #[error("search session token `{token}` was rejected: {reason}")]
    InvalidToken { token: String, reason: String },

    /// The client could not be constructed from its configuration.
    #[error("invalid repository configuration: {0}")]
    Config(String),
}

impl RepositoryError {
    pub fn transport(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        RepositoryError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Failure of a paginated collection run. Both variants are fatal; no partial
/// result is returned alongside them.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("object search failed while fetching page {page}: {source}")]
    SearchFailure {
        page: usize,
        #[source]
        source: RepositoryError,
    },

    #[error("search session token `{token}` rejected while fetching page {page}")]
    InvalidToken {
        page: usize,
        token: String,
        #[source]
        source: RepositoryError,
    },
}

impl CollectError {
    /// Number of the page (1-based) whose fetch failed.
    pub fn page(&self) -> usize {
        match self {
            CollectError::SearchFailure { page, .. } | CollectError::InvalidToken { page, .. } => {
                *page
            }
        }
    }
}

/// Failure of a component operation.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value `{value}` for property `{name}`")]
    InvalidProperty { name: &'static str, value: String },
}
