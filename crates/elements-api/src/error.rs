use thiserror::Error;

/// Errors that can occur when talking to the Elements API.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent or the response body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    Http {
        /// Status code returned by the server.
        status: u16,
        /// Fully-qualified request URL.
        url: String,
    },

    /// The base URL or an endpoint could not be turned into a request URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A response element does not describe a usable record.
    #[error("malformed record `{}`: {reason}", .path.as_deref().unwrap_or("<unknown>"))]
    MalformedRecord {
        /// Path of the offending record, when the element carried one.
        path: Option<String>,
        /// What was wrong with it.
        reason: String,
    },

    /// JSON parsing error.
    #[error("json parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading a response body.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(path: Option<&str>, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            path: path.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Result type for elements-api operations.
pub type Result<T> = std::result::Result<T, Error>;
