use crate::error::{ErrorKind, Result};
use crate::manifest::Photo;
use crate::Context;
use crate::upload::{UploadEvent, UploadRequest, upload};
use exn::OptionExt;
use futures::StreamExt;
use gallery_store::{StoreHandle, Url};

/// Terminal success of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub manifest_path: String,
    /// Entries appended to the manifest, in input order.
    pub uploaded: Vec<Photo>,
    /// Names of files that weren't images.
    pub skipped: Vec<String>,
    /// Public page for the event, when a site URL is configured.
    pub view_url: Option<Url>,
}

/// A finished batch: what was reported along the way, and how it ended.
#[derive(Debug)]
pub struct Report {
    /// Append-only progress log, one line per entry.
    pub transcript: Vec<String>,
    pub outcome: Result<Outcome>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Run a batch to completion, collecting its progress into a transcript.
///
/// The transcript is kept even when the batch fails, and ends with an
/// `ERROR: ...` line in that case.
pub async fn run(store: &StoreHandle, ctx: &Context, request: UploadRequest) -> Report {
    let mut events = Box::pin(upload(store, ctx, request));

    let mut transcript = Vec::new();
    let mut outcome = None;
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                transcript.extend(event.to_string().lines().map(String::from));
                if let UploadEvent::Complete(done) = event {
                    outcome = Some(done);
                }
            },
            Err(e) => {
                transcript.push(format!("ERROR: {}", *e));
                return Report {
                    transcript,
                    outcome: Err(e),
                };
            },
        }
    }
    Report {
        transcript,
        outcome: outcome.ok_or_raise(|| ErrorKind::Validation("upload ended without completing".to_string())),
    }
}
