//! Error type shared by the library modules
//!
//! Partial failures during a build (unresolvable author, missing prior
//! version) are logged and never surface here. Everything in this enum is
//! fatal for the operation that raised it.

use thiserror::Error;

/// Errors that can occur while building, storing, serializing or querying a graph
#[derive(Error, Debug)]
pub enum ProvError {
    #[error("Failed to fetch {what}: {message}")]
    Fetch { what: String, message: String },

    #[error("Upstream returned {status} for {what}: {message}")]
    Upstream {
        what: String,
        status: u16,
        message: String,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not stored: {0}")]
    NotFound(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid repository reference '{0}' (expected owner/name)")]
    InvalidRepoRef(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Graph store error: {0}")]
    Store(#[from] redb::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProvResult<T> = Result<T, ProvError>;

impl ProvError {
    pub fn fetch(what: impl Into<String>, message: impl ToString) -> Self {
        ProvError::Fetch {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ProvError::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for errors raised by the upstream history provider.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            ProvError::Fetch { .. } | ProvError::Upstream { .. } | ProvError::Git(_)
        )
    }
}

// redb splits its errors per operation; funnel them all through redb::Error
macro_rules! from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ProvError {
                fn from(err: $ty) -> Self {
                    ProvError::Store(redb::Error::from(err))
                }
            }
        )*
    };
}

from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
