//! Per-event photo manifest.
//!
//! ```json
//! {
//!   "eventId": "spring-bake",
//!   "photos": [
//!     {
//!       "src": "assets/photos/spring-bake/1717171717171_1_a3f09c.jpg",
//!       "alt": "",
//!       "uploadedAt": "2025-04-12T10:00:00.000Z",
//!       "originalName": "IMG_0001.JPG"
//!     }
//!   ]
//! }
//! ```
//!
//! Existing entries are kept as raw JSON so that fields this crate doesn't
//! know about (captions added by hand, ordering hints...) survive a rewrite
//! untouched. Entries are only ever appended.

mod sync;

pub use self::sync::{FlushedManifest, PendingManifest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    photos: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Manifest {
    pub fn empty(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            ..Self::default()
        }
    }

    /// Raw entries, in order.
    pub fn entries(&self) -> &[Value] {
        &self.photos
    }

    /// Entries that parse as a [`Photo`]; others are skipped.
    pub fn photos(&self) -> impl Iterator<Item = Photo> + '_ {
        self.photos.iter().filter_map(|entry| serde_json::from_value(entry.clone()).ok())
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Whether any entry references `src`.
    pub fn contains(&self, src: &str) -> bool {
        self.photos.iter().any(|entry| entry.get("src").and_then(Value::as_str) == Some(src))
    }

    pub(crate) fn push(&mut self, photo: &Photo) -> serde_json::Result<()> {
        self.photos.push(serde_json::to_value(photo)?);
        Ok(())
    }

    /// The stored representation: 2-space indented JSON plus a trailing newline.
    pub fn to_document(&self) -> serde_json::Result<String> {
        let mut document = serde_json::to_string_pretty(self)?;
        document.push('\n');
        Ok(document)
    }
}

/// One uploaded photo, as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Repository path of the stored photo.
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub original_name: String,
}

impl Photo {
    /// A new entry with an empty caption, stamped with the current time
    /// (millisecond precision).
    pub fn new(src: impl Into<String>, original_name: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            src: src.into(),
            alt: String::new(),
            uploaded_at: now.replace_millisecond(now.millisecond()).unwrap_or(now),
            original_name: original_name.into(),
        }
    }

    pub fn uploaded_at(mut self, uploaded_at: OffsetDateTime) -> Self {
        self.uploaded_at = uploaded_at;
        self
    }
}
