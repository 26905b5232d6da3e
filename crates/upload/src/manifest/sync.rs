use crate::error::{ErrorKind, Operation, Result};
use crate::manifest::{Manifest, Photo};
use crate::{Collection, Context};
use exn::ResultExt;
use gallery_codec::{decode_to_text, encode_text};
use gallery_store::{Credential, Lookup, StoreHandle, Token, WriteRequest};
use serde_json::Value;
use tracing::instrument;

/// A manifest loaded at the start of a batch, accumulating new entries.
///
/// Holds the concurrency token captured at load time; [`flush`](Self::flush)
/// consumes the value so a manifest can only be written back once.
#[derive(Debug)]
pub struct PendingManifest {
    path: String,
    manifest: Manifest,
    token: Option<Token>,
    appended: usize,
}

/// A manifest after its single write.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushedManifest {
    pub path: String,
    pub manifest: Manifest,
    /// Version written. `None` when the store didn't actually write (dry run).
    pub token: Option<Token>,
}

impl PendingManifest {
    /// Fetch the collection's manifest, or start an empty one.
    ///
    /// A missing object and an empty object both yield an empty manifest; the
    /// latter keeps its token so the eventual write replaces it. Content that
    /// doesn't decode fails with [`Decode`](ErrorKind::Decode) rather than
    /// being silently replaced.
    #[instrument(skip_all, fields(event = %collection.event_id))]
    pub async fn load(
        store: &StoreHandle,
        credential: &Credential,
        collection: &Collection,
        ctx: &Context,
    ) -> Result<Self> {
        let path = ctx.manifest_path(&collection.event_id);
        let lookup = store
            .read(credential, &collection.repository, &path, &collection.branch)
            .await
            .map_err(|err| ErrorKind::store(err, Operation::Read, &path))?;

        let (manifest, token) = match lookup {
            Lookup::NotFound => {
                tracing::debug!(%path, "Manifest does not exist yet");
                (Manifest::empty(&collection.event_id), None)
            },
            Lookup::Found(object) => {
                let manifest = Self::decode(&object.content, &path)?.unwrap_or_else(|| {
                    tracing::debug!(%path, "Manifest is empty");
                    Manifest::empty(&collection.event_id)
                });
                (manifest, Some(object.token))
            },
        };
        let mut manifest = manifest;
        if manifest.event_id.is_empty() {
            manifest.event_id = collection.event_id.clone();
        }
        tracing::debug!(%path, photos = manifest.len(), "Manifest loaded");
        Ok(Self {
            path,
            manifest,
            token,
            appended: 0,
        })
    }

    /// `None` for a blank document or a JSON `null`.
    fn decode(content: &str, path: &str) -> Result<Option<Manifest>> {
        let text = decode_to_text(content).or_raise(|| ErrorKind::Decode { path: path.to_string() })?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&text).or_raise(|| ErrorKind::Decode { path: path.to_string() })?;
        if value.is_null() {
            return Ok(None);
        }
        let manifest = serde_json::from_value(value).or_raise(|| ErrorKind::Decode { path: path.to_string() })?;
        Ok(Some(manifest))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Token captured at load time; `None` if the manifest didn't exist.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn exists(&self) -> bool {
        self.token.is_some()
    }

    /// Number of entries appended since loading.
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Record a photo. In memory only until [`flush`](Self::flush).
    pub fn append(&mut self, photo: &Photo) -> Result<()> {
        self.manifest.push(photo).or_raise(|| ErrorKind::Decode { path: self.path.clone() })?;
        self.appended += 1;
        Ok(())
    }

    /// Write the manifest back with one conditional write.
    ///
    /// A manifest that changed since it was loaded fails with
    /// [`Conflict`](ErrorKind::Conflict). No retry is attempted.
    #[instrument(skip_all, fields(path = %self.path, appended = self.appended))]
    pub async fn flush(
        self,
        store: &StoreHandle,
        credential: &Credential,
        collection: &Collection,
    ) -> Result<FlushedManifest> {
        let document = self.manifest.to_document().or_raise(|| ErrorKind::Decode { path: self.path.clone() })?;
        let request = WriteRequest::create(
            &self.path,
            &collection.branch,
            encode_text(document),
            format!("Update photo manifest for {}", collection.event_id),
        )
        .expecting(self.token);
        let committed = store
            .write(credential, &collection.repository, request)
            .await
            .map_err(|err| ErrorKind::store(err, Operation::Flush, &self.path))?;
        tracing::info!(path = %committed.path, photos = self.manifest.len(), "Manifest updated");
        Ok(FlushedManifest {
            path: committed.path,
            manifest: self.manifest,
            token: committed.token,
        })
    }
}
