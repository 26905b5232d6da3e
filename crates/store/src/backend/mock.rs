//! In-memory content store for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{Committed, Credential, Lookup, Repository, StoredObject, Token, WriteRequest};
use crate::{ContentStore, validate_path};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};

/// A call made against a [`MockBackend`], in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read {
        path: String,
        reference: String,
    },
    Write {
        path: String,
        branch: String,
        message: String,
        expected: Option<Token>,
    },
}
impl Call {
    pub fn path(&self) -> &str {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

struct InjectedFailure {
    /// 1-based index of the write call that fails.
    nth: usize,
    status: u16,
    message: String,
}

/// In-memory content store for testing.
///
/// Objects are kept in a `HashMap` behind a [`RwLock`], keyed by path only:
/// repository and branch are recorded in the call history but otherwise
/// ignored. Tokens are BLAKE3 hashes of the stored content, and writes follow
/// the same conditional rules as the real store:
///
/// | object exists | token supplied   | result                |
/// |---------------|------------------|-----------------------|
/// | no            | no               | created               |
/// | no            | yes              | [`Conflict`](ErrorKind::Conflict) |
/// | yes           | no               | [`Conflict`](ErrorKind::Conflict) |
/// | yes           | matching         | updated               |
/// | yes           | stale            | [`Conflict`](ErrorKind::Conflict) |
///
/// # Examples
///
/// ```
/// use gallery_store::backend::MockBackend;
/// use gallery_store::{ContentStore, Credential, Lookup, WriteRequest};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockBackend::with_objects([("assets/a.json", "e30K")]);
/// let credential = Credential::new("token");
/// let repository = "owner/repo".parse()?;
///
/// let Lookup::Found(object) = store.read(&credential, &repository, "assets/a.json", "main").await? else {
///     panic!("object was seeded");
/// };
/// let update = WriteRequest::create("assets/a.json", "main", "W10K", "update").expecting(object.token);
/// store.write(&credential, &repository, update).await?;
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    objects: RwLock<HashMap<String, (String, Token)>>,
    history: Mutex<Vec<Call>>,
    failure: Option<InjectedFailure>,
    unreadable: HashSet<String>,
}

impl MockBackend {
    /// Create a mock store pre-populated with objects (content is transport text).
    ///
    /// Panics if any path fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_objects(objects: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut map = HashMap::new();
        for (path, content) in objects {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_objects: invalid path {path}");
            };
            let content = content.into();
            let token = Self::token_for(&content);
            map.insert(validated, (content, token));
        }
        Self {
            name: "mock".to_string(),
            objects: RwLock::new(map),
            history: Mutex::new(Vec::new()),
            failure: None,
            unreadable: HashSet::new(),
        }
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the `nth` write call (1-based, counting every write) fail with the
    /// given status and message. Nothing is stored for that call.
    pub fn failing_write(mut self, nth: usize, status: u16, message: impl Into<String>) -> Self {
        self.failure = Some(InjectedFailure {
            nth,
            status,
            message: message.into(),
        });
        self
    }

    /// Make reads of `path` fail with [`InvalidResponse`](ErrorKind::InvalidResponse),
    /// the way an object too large to inline does. The object itself is kept.
    ///
    /// Panics if the path fails validation.
    pub fn unreadable(mut self, path: &str) -> Self {
        let Ok(validated) = validate_path(path) else {
            panic!("MockBackend::unreadable: invalid path {path}");
        };
        self.unreadable.insert(validated);
        self
    }

    /// Every call made so far, in order.
    pub async fn history(&self) -> Vec<Call> {
        self.history.lock().await.clone()
    }

    /// Write calls made so far, in order (including rejected ones).
    pub async fn writes(&self) -> Vec<Call> {
        self.history.lock().await.iter().filter(|call| call.is_write()).cloned().collect()
    }

    /// Current state of an object, bypassing the call history.
    pub async fn object(&self, path: &str) -> Option<StoredObject> {
        let path = validate_path(path).ok()?;
        let guard = self.objects.read().await;
        guard.get(&path).map(|(content, token)| StoredObject {
            path: path.clone(),
            content: content.clone(),
            token: token.clone(),
        })
    }

    /// Replace an object out-of-band, as another operator would. Bypasses the
    /// conditional-write rules and the call history.
    pub async fn replace(&self, path: &str, content: impl Into<String>) -> Token {
        let Ok(path) = validate_path(path) else {
            panic!("MockBackend::replace: invalid path {path}");
        };
        let content = content.into();
        let token = Self::token_for(&content);
        self.objects.write().await.insert(path, (content, token.clone()));
        token
    }

    /// Number of objects currently stored.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn token_for(content: &str) -> Token {
        Token::new(blake3::hash(content.as_bytes()).to_hex().to_string())
    }

    fn conflict(path: &str, message: &str) -> ErrorKind {
        ErrorKind::Conflict {
            path: path.to_string(),
            status: 409,
            message: message.to_string(),
        }
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let objects: [(&str, &str); 0] = [];
        Self::with_objects(objects)
    }
}

#[async_trait]
impl ContentStore for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(
        &self,
        _credential: &Credential,
        _repository: &Repository,
        path: &str,
        reference: &str,
    ) -> Result<Lookup> {
        let path = validate_path(path)?;
        self.history.lock().await.push(Call::Read {
            path: path.clone(),
            reference: reference.to_string(),
        });
        if self.unreadable.contains(&path) {
            exn::bail!(ErrorKind::InvalidResponse(format!("GET {path}: content not inlined")));
        }
        let guard = self.objects.read().await;
        Ok(match guard.get(&path) {
            Some((content, token)) => Lookup::Found(StoredObject {
                path,
                content: content.clone(),
                token: token.clone(),
            }),
            None => Lookup::NotFound,
        })
    }

    async fn write(
        &self,
        _credential: &Credential,
        _repository: &Repository,
        request: WriteRequest,
    ) -> Result<Committed> {
        let path = validate_path(&request.path)?;
        let nth = {
            let mut history = self.history.lock().await;
            history.push(Call::Write {
                path: path.clone(),
                branch: request.branch.clone(),
                message: request.message.clone(),
                expected: request.expected.clone(),
            });
            history.iter().filter(|call| call.is_write()).count()
        };
        if let Some(failure) = &self.failure
            && failure.nth == nth
        {
            exn::bail!(ErrorKind::Status {
                status: failure.status,
                message: failure.message.clone(),
            });
        }

        let mut guard = self.objects.write().await;
        match (guard.get(&path), &request.expected) {
            (None, None) => {},
            (None, Some(_)) => exn::bail!(Self::conflict(&path, "object no longer exists")),
            (Some(_), None) => exn::bail!(Self::conflict(&path, "\"sha\" wasn't supplied")),
            (Some((_, current)), Some(expected)) if current == expected => {},
            (Some((_, current)), Some(expected)) => {
                exn::bail!(Self::conflict(&path, &format!("is at {current} but expected {expected}")))
            },
        }
        let token = Self::token_for(&request.content);
        guard.insert(path.clone(), (request.content, token.clone()));
        Ok(Committed { path, token: Some(token) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Credential, Repository) {
        (Credential::new("token"), "owner/repo".parse().unwrap())
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let (credential, repository) = fixtures();
        let store = MockBackend::default();
        let committed = store
            .write(&credential, &repository, WriteRequest::create("a/b.jpg", "main", "Zm9v", "upload"))
            .await
            .unwrap();
        assert_eq!(committed.path, "a/b.jpg");

        let Lookup::Found(object) = store.read(&credential, &repository, "a/b.jpg", "main").await.unwrap() else {
            panic!("object should exist");
        };
        assert_eq!(object.content, "Zm9v");
        assert_eq!(Some(object.token), committed.token);
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (credential, repository) = fixtures();
        let store = MockBackend::default();
        let lookup = store.read(&credential, &repository, "missing.json", "main").await.unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_update_with_current_token() {
        let (credential, repository) = fixtures();
        let store = MockBackend::with_objects([("m.json", "e30K")]);
        let token = store.object("m.json").await.unwrap().token;
        let request = WriteRequest::create("m.json", "main", "W10K", "update").expecting(token.clone());
        let committed = store.write(&credential, &repository, request).await.unwrap();
        assert_ne!(committed.token, Some(token));
        assert_eq!(store.object("m.json").await.unwrap().content, "W10K");
    }

    #[tokio::test]
    async fn test_stale_token_conflicts() {
        let (credential, repository) = fixtures();
        let store = MockBackend::with_objects([("m.json", "e30K")]);
        let token = store.object("m.json").await.unwrap().token;
        store.replace("m.json", "eyJhIjoxfQo=").await;

        let request = WriteRequest::create("m.json", "main", "W10K", "update").expecting(token);
        let err = store.write(&credential, &repository, request).await.unwrap_err();
        assert!(err.is_conflict());
        // Nothing written.
        assert_eq!(store.object("m.json").await.unwrap().content, "eyJhIjoxfQo=");
    }

    #[tokio::test]
    async fn test_create_over_existing_conflicts() {
        let (credential, repository) = fixtures();
        let store = MockBackend::with_objects([("m.json", "e30K")]);
        let err = store
            .write(&credential, &repository, WriteRequest::create("m.json", "main", "W10K", "create"))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let (credential, repository) = fixtures();
        let store = MockBackend::default().failing_write(2, 500, "boom");
        store.write(&credential, &repository, WriteRequest::create("1", "main", "", "")).await.unwrap();
        let err = store.write(&credential, &repository, WriteRequest::create("2", "main", "", "")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(store.len().await, 1);
        assert_eq!(store.writes().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_object() {
        let (credential, repository) = fixtures();
        let store = MockBackend::with_objects([("m.json", "e30K")]).unreadable("m.json");
        let err = store.read(&credential, &repository, "m.json", "main").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
        assert_eq!(store.history().await.len(), 1);
        assert!(store.object("m.json").await.is_some());
    }

    #[tokio::test]
    async fn test_history_order() {
        let (credential, repository) = fixtures();
        let store = MockBackend::default();
        store.read(&credential, &repository, "m.json", "dev").await.unwrap();
        store.write(&credential, &repository, WriteRequest::create("x.jpg", "dev", "", "msg")).await.unwrap();
        let history = store.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Call::Read { path: "m.json".into(), reference: "dev".into() });
        assert!(history[1].is_write());
        assert_eq!(history[1].path(), "x.jpg");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (credential, repository) = fixtures();
        let store = MockBackend::default();
        assert!(store.read(&credential, &repository, "../etc/passwd", "main").await.is_err());
        assert!(store.history().await.is_empty());
    }

    #[test]
    #[should_panic(expected = "invalid path")]
    fn test_with_objects_panics_on_bad_path() {
        MockBackend::with_objects([("../escape", "bad")]);
    }
}
