//! Codec Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A codec error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Encoding is total, so every variant describes input that failed to decode.
/// Retrying with the same input will always fail the same way.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input is not well-formed base64 (after whitespace was stripped).
    #[display("invalid or corrupted transport text")]
    InvalidData,
    /// Input decoded to bytes, but those bytes are not UTF-8.
    #[display("decoded content is not valid UTF-8")]
    InvalidUtf8,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
