use crate::attributes::MetadataKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A remote lookup failed. Never cached, so retrying is always safe.
#[derive(Debug, Error)]
#[error("unable to retrieve `{path}`")]
pub struct RetrievalError {
    /// Store path that was being looked up.
    pub path: String,
    #[source]
    pub source: elements_api::Error,
}

impl RetrievalError {
    pub(crate) fn new(path: &str, source: elements_api::Error) -> Self {
        Self {
            path: path.to_string(),
            source,
        }
    }
}

/// Why a read operation failed.
#[derive(Debug, Error)]
pub enum Reason {
    #[error("not found")]
    NotFound,
    #[error("not a file")]
    NotAFile,
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Mutating operations, all of which are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    WriteStream,
    Delete,
    DeleteDirectory,
    CreateDirectory,
    SetVisibility,
    Move,
    Copy,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Write => "write",
            Operation::WriteStream => "write stream",
            Operation::Delete => "delete",
            Operation::DeleteDirectory => "delete directory",
            Operation::CreateDirectory => "create directory",
            Operation::SetVisibility => "set visibility",
            Operation::Move => "move",
            Operation::Copy => "copy",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`ElementsAdapter`](crate::ElementsAdapter).
///
/// Paths are the ones the caller passed in, before prefixing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to check existence of `{path}`")]
    CheckExistence {
        path: String,
        #[source]
        reason: Reason,
    },

    #[error("unable to retrieve {kind} of `{path}`")]
    RetrieveMetadata {
        path: String,
        kind: MetadataKind,
        #[source]
        reason: Reason,
    },

    #[error("unable to read `{path}`")]
    Read {
        path: String,
        #[source]
        reason: Reason,
    },

    #[error("unable to list contents of `{path}`")]
    ListContents {
        path: String,
        #[source]
        reason: Reason,
    },

    #[error("{operation} is not supported: `{path}`")]
    Unsupported { operation: Operation, path: String },

    #[error("{operation} is not supported: `{from}` to `{to}`")]
    UnsupportedTransfer {
        operation: Operation,
        from: String,
        to: String,
    },
}

impl Error {
    /// Underlying cause of a failed read operation.
    pub fn reason(&self) -> Option<&Reason> {
        match self {
            Error::CheckExistence { reason, .. }
            | Error::RetrieveMetadata { reason, .. }
            | Error::Read { reason, .. }
            | Error::ListContents { reason, .. } => Some(reason),
            Error::Unsupported { .. } | Error::UnsupportedTransfer { .. } => None,
        }
    }

    /// True when the failure means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.reason(), Some(Reason::NotFound))
    }

    /// True for refused mutating operations.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::Unsupported { .. } | Error::UnsupportedTransfer { .. }
        )
    }
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors loading the adapter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Client(#[from] elements_api::Error),
}
