//! Batch upload orchestration.
//!
//! [`upload`] validates an [`UploadRequest`], loads the event manifest once,
//! writes each image in input order, then flushes the manifest with a single
//! conditional write. Progress is reported as a stream of [`UploadEvent`]s;
//! [`run`] collects that stream into a [`Report`].

mod report;
mod stream;

pub use self::report::{Outcome, Report, run};
pub use self::stream::{UploadEvent, upload};
use crate::error::{ErrorKind, Result};
use crate::{Candidate, Collection, Context};
use gallery_store::{Credential, Repository};

/// Everything a single batch needs from the operator.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// `owner/name`; validated, not yet parsed.
    pub repository: String,
    pub branch: String,
    pub event_id: String,
    pub credential: Credential,
    pub files: Vec<Candidate>,
}

impl UploadRequest {
    /// Check the request before anything touches the store.
    ///
    /// Checks run in a fixed order and the first failure wins: event,
    /// credential, repository, branch, files, catalog membership.
    pub fn validate(&self, ctx: &Context) -> Result<Collection> {
        let event_id = self.event_id.trim();
        if event_id.is_empty() {
            exn::bail!(ErrorKind::Validation("choose an event".to_string()));
        }
        if event_id.contains('/') || event_id == "." || event_id == ".." {
            exn::bail!(ErrorKind::Validation(format!("invalid event id: {event_id}")));
        }
        if self.credential.is_empty() {
            exn::bail!(ErrorKind::Validation("token required".to_string()));
        }
        let Ok(repository) = self.repository.parse::<Repository>() else {
            exn::bail!(ErrorKind::Validation("repository must be owner/repo".to_string()));
        };
        let branch = self.branch.trim();
        if branch.is_empty() {
            exn::bail!(ErrorKind::Validation("branch required".to_string()));
        }
        if self.files.is_empty() {
            exn::bail!(ErrorKind::Validation("choose photos first".to_string()));
        }
        if let Some(catalog) = &ctx.catalog
            && !catalog.contains(event_id)
        {
            exn::bail!(ErrorKind::Validation(format!("unknown event: {event_id}")));
        }
        Ok(Collection {
            repository,
            branch: branch.to_string(),
            event_id: event_id.to_string(),
        })
    }
}
