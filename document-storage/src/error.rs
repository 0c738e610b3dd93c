//! Error types for the document storage gateway

use std::fmt;

use thiserror::Error;

/// Closed set of failure kinds reported by stores and transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The object (or bucket) does not exist
    NotFound,
    /// The store rejected the credentials or the signature
    Unauthorized,
    /// Network, timeout or response-parsing failure
    Transport,
    /// Anything the store reported that fits none of the above
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Transport => "transport failure",
            ErrorKind::Unknown => "unknown error",
        }
    }

    /// Classify an HTTP status returned by the store
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => ErrorKind::NotFound,
            401 | 403 => ErrorKind::Unauthorized,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by an [`ObjectBackend`](crate::ObjectBackend) or a
/// [`UrlTransfer`](crate::UrlTransfer)
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct StoreError {
    pub kind: ErrorKind,
    #[source]
    pub source: anyhow::Error,
}

impl StoreError {
    pub fn new(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn not_found(key: &str) -> Self {
        Self::new(ErrorKind::NotFound, anyhow::anyhow!("object not found: {}", key))
    }

    pub fn transport(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorKind::Transport, source)
    }

    pub fn unknown(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorKind::Unknown, source)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Gateway operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Delete,
    IssueUrl,
    Metadata,
    Exists,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Delete => "delete",
            Operation::IssueUrl => "issue URL for",
            Operation::Metadata => "get metadata for",
            Operation::Exists => "check existence of",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced by [`DocumentGateway`](crate::DocumentGateway) operations
///
/// The message names the operation ("Failed to create document") and the
/// kind; the original store error stays reachable through `source()`.
#[derive(Debug, Error)]
#[error("Failed to {operation} document: {kind}")]
pub struct DocumentError {
    pub operation: Operation,
    pub kind: ErrorKind,
    #[source]
    source: anyhow::Error,
}

impl DocumentError {
    pub fn new(operation: Operation, err: StoreError) -> Self {
        Self {
            operation,
            kind: err.kind,
            source: err.source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// The underlying store or transport error
    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
