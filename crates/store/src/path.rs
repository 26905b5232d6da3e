//! Object path validation.
//!
//! Store paths are `/`-separated keys relative to the repository root. They
//! are never touched by the local filesystem, so validation works on strings
//! rather than [`std::path::Path`] and keeps every segment byte-for-byte
//! (backslashes included); backends percent-encode each segment on their own.

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a store path.
/// Ensures that paths don't escape the repository root (no `..` traversal).
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use gallery_store::validate_path;
/// // Valid paths
/// assert!(validate_path("assets/photos/2024-10-05/manifest.json").is_ok());
/// assert!(validate_path("a/../file.jpg").is_ok()); // (never leaves repository root)
/// // Invalid paths
/// assert!(validate_path("../secrets").is_err());
/// assert!(validate_path("a/../../b").is_err()); // (leaves repository root)
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(
///     validate_path("/wrong/../still-wrong/.././correct//./photo.jpg/").unwrap(),
///     "correct/photo.jpg"
/// );
/// ```
pub fn validate(path: impl AsRef<str>) -> Result<String> {
    let raw = path.as_ref();
    let mut segments = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if segments.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                }
            },
            // NUL bytes make it through HTTP libraries but not through git.
            s if s.contains('\0') => exn::bail!(ErrorKind::InvalidPath(raw.to_string())),
            s => segments.push(s),
        }
    }
    match segments.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(raw.to_string())),
        false => Ok(segments.join("/")),
    }
}
