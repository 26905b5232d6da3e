//! Storage names for uploaded photos.
//!
//! Every photo gets a fresh name of the form
//! `<unix millis>_<position>_<6 hex digits>.<extension>`, e.g.
//! `1717171717171_2_a3f09c.jpg`. The original filename only contributes its
//! extension, so names never collide with (or leak) whatever the uploader
//! called the file. Collisions between runs are improbable but not ruled out.

use crate::file::Candidate;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use time::OffsetDateTime;

static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Za-z0-9]{1,8})$").expect("valid extension pattern"));

/// Fallback when neither the filename nor the content type says anything useful.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Generate a storage name for the candidate at 1-based input `position`.
///
/// Uses the current wall-clock time and thread-local randomness; see
/// [`compose`] for the deterministic part.
pub fn name_for(candidate: &Candidate, position: usize) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::rng().random();
    compose(millis, position, suffix, &extension_for(&candidate.name, &candidate.content_type))
}

/// Deterministic core of [`name_for`]. Only the low 24 bits of `suffix` are used.
pub fn compose(millis: i128, position: usize, suffix: u32, extension: &str) -> String {
    format!("{millis}_{position}_{:06x}.{extension}", suffix & 0x00FF_FFFF)
}

/// Pick an extension: the filename's own (lowercased) if it has a short
/// alphanumeric one, otherwise one implied by the content type.
pub fn extension_for(filename: &str, content_type: &str) -> String {
    if let Some(captures) = EXTENSION.captures(filename) {
        return captures[1].to_ascii_lowercase();
    }
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => FALLBACK_EXTENSION,
    }
    .to_string()
}
