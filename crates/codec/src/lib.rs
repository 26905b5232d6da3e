//! Transport-safe text encoding.
//!
//! The content store only accepts object bodies embedded in JSON request
//! bodies, so everything written to it (photos and manifests alike) travels as
//! standard, padded base64. This crate is the single place that knows that:
//!
//! - [`encode_binary`] / [`decode_binary`] for raw bytes (photo content),
//! - [`encode_text`] / [`decode_to_text`] for UTF-8 documents (manifests).
//!
//! Decoding tolerates incidental whitespace anywhere in the input: the store
//! hands content back wrapped at 60 columns.

pub mod error;

use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use tracing::instrument;

/// Encode arbitrary bytes as transport-safe text.
///
/// Total and deterministic: the same input always produces the same output,
/// and [`decode_binary`] returns the exact input.
///
/// ```
/// assert_eq!(gallery_codec::encode_binary(b"\xFF\xD8\xFF"), "/9j/");
/// ```
#[instrument(level = "trace", skip(bytes), fields(input_size = bytes.as_ref().len()))]
pub fn encode_binary(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Encode a UTF-8 document as transport-safe text.
///
/// ```
/// assert_eq!(gallery_codec::encode_text("{}\n"), "e30K");
/// ```
pub fn encode_text(text: impl AsRef<str>) -> String {
    encode_binary(text.as_ref().as_bytes())
}

/// Decode transport-safe text back into raw bytes.
///
/// Whitespace (spaces, tabs, line breaks) is stripped before decoding.
/// Returns [`InvalidData`](ErrorKind::InvalidData) for anything that is not
/// well-formed padded base64.
#[instrument(level = "trace", skip(text), fields(input_size = text.as_ref().len()))]
pub fn decode_binary(text: impl AsRef<str>) -> Result<Vec<u8>> {
    let clean: String = text.as_ref().chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(clean.as_bytes()).or_raise(|| ErrorKind::InvalidData)
}

/// Decode transport-safe text into a UTF-8 string.
///
/// Used for reading back manifest bodies, never photo content.
///
/// ```
/// let text = gallery_codec::decode_to_text("eyJldmVu\ndElkIjoi\nYSJ9").unwrap();
/// assert_eq!(text, r#"{"eventId":"a"}"#);
/// ```
pub fn decode_to_text(text: impl AsRef<str>) -> Result<String> {
    let bytes = decode_binary(text)?;
    String::from_utf8(bytes).or_raise(|| ErrorKind::InvalidUtf8)
}
