//! Dry-run store backend.
//!
//! Wraps another implementation, passing reads through and skipping writes
//! while still indicating success on return.

use crate::error::Result;
use crate::models::{Committed, Credential, Lookup, Repository, WriteRequest};
use crate::{ContentStore, StoreHandle, validate_path};
use async_trait::async_trait;

/// Dry-run content store.
///
/// Wraps another store and silently drops all write operations, logging an
/// [`info event`](tracing::Event) for each. Committed writes carry no token,
/// because no new version was created.
#[derive(Clone)]
pub struct DryRunBackend {
    inner: StoreHandle,
}
impl DryRunBackend {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ContentStore for DryRunBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn read(
        &self,
        credential: &Credential,
        repository: &Repository,
        path: &str,
        reference: &str,
    ) -> Result<Lookup> {
        self.inner.read(credential, repository, path, reference).await
    }

    async fn write(
        &self,
        _credential: &Credential,
        repository: &Repository,
        request: WriteRequest,
    ) -> Result<Committed> {
        let path = validate_path(&request.path)?;
        tracing::info!(
            %repository,
            path = %path,
            branch = %request.branch,
            bytes = request.content.len(),
            conditional = request.expected.is_some(),
            "Skipping write during dry run"
        );
        Ok(Committed { path, token: None })
    }
}
