use std::fmt;
use thiserror::Error;

/// The error delivered to a request callback.
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of outcome error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resolved path contains characters that can't be sent unescaped.
    InvalidPath,

    /// Credentials, signing or the network failed.
    Connection,

    /// The request timeout elapsed before response headers arrived.
    Timeout,

    /// The request was aborted through its handle while in flight.
    RequestAborted,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the bare message without the kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if the path was rejected before anything was sent.
    pub fn is_invalid_path(&self) -> bool {
        self.kind == ErrorKind::InvalidPath
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        self.kind == ErrorKind::Connection
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Check if the request was aborted
    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::RequestAborted
    }
}

// Convenience constructors
impl Error {
    /// Create an invalid path error for the given path.
    pub fn invalid_path(path: &str) -> Self {
        Self::new(
            ErrorKind::InvalidPath,
            format!("ERR_UNESCAPED_CHARACTERS: {path}"),
        )
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Create a timeout error
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout, "Request timed out")
    }

    /// Create a request aborted error
    pub fn aborted() -> Self {
        Self::new(ErrorKind::RequestAborted, "Request aborted")
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidPath => write!(f, "invalid path"),
            ErrorKind::Connection => write!(f, "connection error"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::RequestAborted => write!(f, "request aborted"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

impl From<esauth_core::Error> for Error {
    fn from(err: esauth_core::Error) -> Self {
        Self::connection(err.to_string()).with_source(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout().with_source(err)
        } else {
            Self::connection(err.to_string()).with_source(err)
        }
    }
}
