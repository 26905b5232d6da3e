//! Content store trait and implementations.
//!
//! This module defines the [`ContentStore`] trait: a path-addressed,
//! versioned object store protected by conditional writes. The production
//! implementation talks to the GitHub contents API; the others decorate it
//! or replace it in tests.

mod dry_run;
mod github;
#[cfg(feature = "mock")]
mod mock;

pub use self::dry_run::DryRunBackend;
pub use self::github::{DEFAULT_API_URL, GitHubBackend};
#[cfg(feature = "mock")]
pub use self::mock::{Call, MockBackend};
use crate::error::Result;
use crate::models::{Committed, Credential, Lookup, Repository, WriteRequest};
use async_trait::async_trait;

/// Unified interface for versioned content stores.
///
/// Every operation is a single remote round-trip. Implementations must not
/// retry on their own: the caller decides what a failure means.
///
/// # Path Handling
/// All paths are relative to the repository root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use gallery_store::{ContentStore, Credential, Lookup, Repository, error::Result};
///
/// async fn manifest_exists(store: &dyn ContentStore, credential: &Credential) -> Result<bool> {
///     let repository: Repository = "cookiesquad/site".parse()?;
///     let lookup = store.read(credential, &repository, "assets/photos/a/manifest.json", "main").await?;
///     Ok(matches!(lookup, Lookup::Found(_)))
/// }
/// ```
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Read an object on the given branch (or any other ref).
    ///
    /// Returns [`Lookup::NotFound`] when the object does not exist; every
    /// other failure is an error.
    async fn read(
        &self,
        credential: &Credential,
        repository: &Repository,
        path: &str,
        reference: &str,
    ) -> Result<Lookup>;

    /// Write an object.
    ///
    /// Without [`expected`](WriteRequest::expected) the object is created;
    /// with it, the write only succeeds if the object is still at that
    /// version. Rejected conditional writes are reported as
    /// [`Conflict`](crate::error::ErrorKind::Conflict).
    async fn write(
        &self,
        credential: &Credential,
        repository: &Repository,
        request: WriteRequest,
    ) -> Result<Committed>;
}
