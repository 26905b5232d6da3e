//! Upload Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Store failures keep the store's own
//! `Exn` frame as a child, so the full tree is available to the caller.
//!
//! Every error aborts the batch. Photos already written before the failure
//! stay in the store, unreferenced by the manifest.

use derive_more::{Display, Error};
use gallery_store::error::Error as StoreError;

/// An upload error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which remote operation a [`Store`](ErrorKind::Store) error came from.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    #[display("reading")]
    Read,
    #[display("uploading")]
    Upload,
    #[display("updating")]
    Flush,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected before any remote call was made.
    #[display("{_0}")]
    Validation(#[error(not(source))] String),
    /// Somebody else changed the manifest after it was loaded. Nothing was
    /// retried; reload and run the batch again.
    #[display("{path} was changed by someone else since it was loaded")]
    Conflict { path: String },
    /// Any other failed store call.
    #[display("{operation} {path} failed: {message}")]
    Store {
        operation: Operation,
        path: String,
        message: String,
        /// Whether the store said a retry might succeed.
        retryable: bool,
    },
    /// A stored document isn't valid transport text, UTF-8 or JSON.
    #[display("could not decode {path}")]
    Decode { path: String },
    /// The event catalog couldn't be loaded or parsed.
    #[display("could not load event catalog: {_0}")]
    Catalog(#[error(not(source))] String),
    /// A local file couldn't be read.
    #[display("could not read {_0}")]
    File(#[error(not(source))] String),
}

impl ErrorKind {
    /// Wrap a store error, preserving its `Exn` frame as a child in the tree.
    ///
    /// A conflicting manifest update becomes [`Conflict`](Self::Conflict);
    /// everything else, photo name collisions included, becomes
    /// [`Store`](Self::Store) carrying the store's message.
    #[track_caller]
    pub fn store(err: StoreError, operation: Operation, path: impl Into<String>) -> Error {
        let path = path.into();
        let kind = if operation == Operation::Flush && err.is_conflict() {
            Self::Conflict { path }
        } else {
            Self::Store {
                operation,
                path,
                message: (*err).to_string(),
                retryable: err.is_retryable(),
            }
        };
        err.raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in this crate retries; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store { retryable: true, .. })
    }
}
