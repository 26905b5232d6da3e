use crate::Context;
use crate::error::{ErrorKind, Operation, Result};
use crate::manifest::{PendingManifest, Photo};
use crate::naming::name_for;
use crate::upload::{Outcome, UploadRequest};
use async_stream::stream;
use futures::Stream;
use gallery_codec::encode_binary;
use gallery_store::{Repository, StoreHandle, WriteRequest};
use std::fmt;

/// Progress events emitted by [`upload`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once, after validation.
/// 2. [`ManifestLoaded`](Self::ManifestLoaded) exactly once.
/// 3. Per input file, in input order, either [`Skipped`](Self::Skipped) or
///    [`Uploading`](Self::Uploading) followed by [`Uploaded`](Self::Uploaded).
/// 4. [`ManifestUpdated`](Self::ManifestUpdated) exactly once.
/// 5. [`Complete`](Self::Complete) exactly once.
///
/// An error terminates the stream; nothing follows it.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started {
        repository: Repository,
        branch: String,
        event_id: String,
        files: usize,
    },
    ManifestLoaded {
        path: String,
        photos: usize,
        exists: bool,
    },
    /// The file isn't an image. It still consumed its input position.
    Skipped { name: String, content_type: String },
    Uploading { name: String, path: String },
    Uploaded { name: String, path: String },
    ManifestUpdated { path: String },
    Complete(Outcome),
}

impl fmt::Display for UploadEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                repository,
                branch,
                event_id,
                files,
            } => write!(f, "Repo: {repository} ({branch})\nEvent: {event_id}\nFiles: {files}"),
            Self::ManifestLoaded { path, exists: false, .. } => write!(f, "Manifest: {path} (new)"),
            Self::ManifestLoaded { path, photos, .. } => write!(f, "Manifest: {path} ({photos} existing)"),
            Self::Skipped { name, .. } => write!(f, "Skipping non-image: {name}"),
            Self::Uploading { name, path } => write!(f, "Uploading {name} -> {path}"),
            Self::Uploaded { path, .. } => write!(f, "Uploaded {path}"),
            Self::ManifestUpdated { path } => write!(f, "Manifest updated: {path}"),
            Self::Complete(outcome) => match &outcome.view_url {
                Some(url) => write!(f, "Done.\nView: {url}"),
                None => f.write_str("Done."),
            },
        }
    }
}

/// Streams [`UploadEvent`]s while running one batch.
///
/// The request is validated before anything else; a rejected request yields a
/// single [`Validation`](ErrorKind::Validation) error and makes no store
/// calls. After that the store sees, strictly one at a time: one manifest
/// read, one write per image, one conditional manifest write.
///
/// Any failed write is fatal. Photos written earlier are left in place and
/// the manifest is not touched.
pub fn upload<'a>(
    store: &'a StoreHandle,
    ctx: &'a Context,
    request: UploadRequest,
) -> impl Stream<Item = Result<UploadEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let collection = match request.validate(ctx) {
            Ok(collection) => collection,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let UploadRequest { credential, files, .. } = request;
        tracing::info!(
            repository = %collection.repository,
            branch = %collection.branch,
            event = %collection.event_id,
            files = files.len(),
            "Starting upload"
        );
        yield Ok(UploadEvent::Started {
            repository: collection.repository.clone(),
            branch: collection.branch.clone(),
            event_id: collection.event_id.clone(),
            files: files.len(),
        });

        let mut manifest = match PendingManifest::load(store, &credential, &collection, ctx).await {
            Ok(manifest) => manifest,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(UploadEvent::ManifestLoaded {
            path: manifest.path().to_string(),
            photos: manifest.manifest().len(),
            exists: manifest.exists(),
        });

        let message = format!("Upload photo for {}", collection.event_id);
        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        for (index, file) in files.into_iter().enumerate() {
            if !file.is_image() {
                tracing::debug!(name = %file.name, content_type = %file.content_type, "Skipping non-image");
                skipped.push(file.name.clone());
                yield Ok(UploadEvent::Skipped { name: file.name, content_type: file.content_type });
                continue;
            }

            let path = ctx.photo_path(&collection.event_id, &name_for(&file, index + 1));
            yield Ok(UploadEvent::Uploading { name: file.name.clone(), path: path.clone() });
            let request = WriteRequest::create(&path, &collection.branch, encode_binary(&file.data), &message);
            if let Err(e) = store.write(&credential, &collection.repository, request).await {
                tracing::error!(%path, "Upload failed, manifest left untouched");
                yield Err(ErrorKind::store(e, Operation::Upload, path));
                return;
            }

            let photo = Photo::new(&path, &file.name);
            if let Err(e) = manifest.append(&photo) {
                yield Err(e);
                return;
            }
            uploaded.push(photo);
            yield Ok(UploadEvent::Uploaded { name: file.name, path });
        }

        let flushed = match manifest.flush(store, &credential, &collection).await {
            Ok(flushed) => flushed,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(UploadEvent::ManifestUpdated { path: flushed.path.clone() });

        tracing::info!(uploaded = uploaded.len(), skipped = skipped.len(), "Upload complete");
        yield Ok(UploadEvent::Complete(Outcome {
            manifest_path: flushed.path,
            view_url: ctx.view_url(&collection.event_id),
            uploaded,
            skipped,
        }));
    })
}
