//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! An object that does not exist is *not* an error: reads return
//! [`Lookup::NotFound`](crate::Lookup::NotFound) so that callers are forced to
//! handle "first use" explicitly.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The object changed since it was last read (stale or missing
    /// concurrency token). Re-read before writing again.
    #[display("conflicting write to {path}: {message}")]
    Conflict { path: String, status: u16, message: String },
    /// Any other non-2xx response. The message is taken verbatim from the
    /// store when it sent one.
    #[display("store responded with {status}: {message}")]
    Status { status: u16, message: String },
    /// The request never produced a response (DNS, TLS, connection reset...).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The store answered successfully, but not with what we expected.
    #[display("invalid response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// Path is empty, contains NUL bytes or escapes the repository root.
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// Repository is not in `owner/name` form.
    #[display("invalid repository (expected owner/name): {_0}")]
    InvalidRepository(#[error(not(source))] String),
    /// The configured API endpoint can't be used as a base URL.
    #[display("invalid API URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
}

impl ErrorKind {
    /// Numeric HTTP status attached to the error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Conflict { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the error was a conflicting (conditional) write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
