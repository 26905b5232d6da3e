//! Batch photo upload for event galleries.
//!
//! A batch writes every image file of a request into the event's photo
//! directory, one store call per file, then records them all in the event's
//! manifest with a single conditional write. See [`upload`](upload::upload)
//! for the orchestration and [`PendingManifest`] for the manifest lifecycle.

pub mod catalog;
pub mod error;
mod file;
pub mod manifest;
pub mod naming;
pub mod upload;

pub use crate::catalog::Catalog;
pub use crate::file::{Candidate, content_type_for};
pub use crate::manifest::{FlushedManifest, Manifest, PendingManifest, Photo};
pub use crate::upload::{Outcome, Report, UploadEvent, UploadRequest, run, upload};
use gallery_store::{Repository, Url};

pub const DEFAULT_PHOTOS_DIR: &str = "assets/photos";
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Where a batch writes to: one event inside one repository branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub repository: Repository,
    pub branch: String,
    pub event_id: String,
}

/// Site layout shared by every batch.
#[derive(Debug, Clone)]
pub struct Context {
    /// Repository directory holding one sub-directory per event.
    pub photos_dir: String,
    /// Public site root; enables [`Outcome::view_url`].
    pub site_url: Option<Url>,
    /// When present, only events listed here are accepted.
    pub catalog: Option<Catalog>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            photos_dir: DEFAULT_PHOTOS_DIR.to_string(),
            site_url: None,
            catalog: None,
        }
    }
}

impl Context {
    pub fn new(photos_dir: impl Into<String>) -> Self {
        Self {
            photos_dir: photos_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_site_url(mut self, site_url: impl Into<Option<Url>>) -> Self {
        self.site_url = site_url.into();
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<Option<Catalog>>) -> Self {
        self.catalog = catalog.into();
        self
    }

    fn event_dir(&self, event_id: &str) -> String {
        let dir = self.photos_dir.trim_matches('/');
        if dir.is_empty() { event_id.to_string() } else { format!("{dir}/{event_id}") }
    }

    /// `<photos_dir>/<event>/manifest.json`
    pub fn manifest_path(&self, event_id: &str) -> String {
        format!("{}/{MANIFEST_FILENAME}", self.event_dir(event_id))
    }

    /// `<photos_dir>/<event>/<name>`
    pub fn photo_path(&self, event_id: &str, name: &str) -> String {
        format!("{}/{name}", self.event_dir(event_id))
    }

    /// `<site_url>/event/?id=<event>`, when a site URL is configured.
    pub fn view_url(&self, event_id: &str) -> Option<Url> {
        let mut url = self.site_url.clone()?;
        {
            let mut segments = url.path_segments_mut().ok()?;
            segments.pop_if_empty().push("event").push("");
        }
        url.query_pairs_mut().clear().append_pair("id", event_id);
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("assets/photos", "spring-bake", "assets/photos/spring-bake/manifest.json")]
    #[case("/photos/", "x", "photos/x/manifest.json")]
    #[case("", "x", "x/manifest.json")]
    fn test_manifest_path(#[case] dir: &str, #[case] event: &str, #[case] expected: &str) {
        assert_eq!(Context::new(dir).manifest_path(event), expected);
    }

    #[test]
    fn test_photo_path() {
        let ctx = Context::default();
        assert_eq!(ctx.photo_path("a", "1_1_abcdef.jpg"), "assets/photos/a/1_1_abcdef.jpg");
    }

    #[rstest]
    #[case("https://cookiesquad.example", "spring", "https://cookiesquad.example/event/?id=spring")]
    #[case("https://example.org/site/", "spring", "https://example.org/site/event/?id=spring")]
    #[case("https://example.org", "bake sale & more", "https://example.org/event/?id=bake+sale+%26+more")]
    fn test_view_url(#[case] site: &str, #[case] event: &str, #[case] expected: &str) {
        let ctx = Context::default().with_site_url(Url::parse(site).unwrap());
        assert_eq!(ctx.view_url(event).unwrap().as_str(), expected);
    }

    #[test]
    fn test_view_url_without_site() {
        assert_eq!(Context::default().view_url("spring"), None);
    }
}
