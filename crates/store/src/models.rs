//! Store models.
//!
//! Request and response types shared by every [`ContentStore`](crate::ContentStore)
//! implementation. Object content is always *transport text* (see
//! `gallery-codec`); the store never sees raw bytes.

use crate::error::{Error, ErrorKind};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static REPOSITORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)$").expect("valid repository pattern"));

/// Opaque value identifying one exact version of a stored object.
///
/// Obtained from every read and every write; handing it back on the next
/// write makes that write conditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);
impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Bearer credential for the store.
///
/// Owned by the caller and passed into every call; nothing in this workspace
/// persists it. `Debug` is redacted so it can't leak through logs or error
/// trees.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);
impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// An `owner/name` repository inside the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    owner: String,
    name: String,
}
impl Repository {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
impl FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(captures) = REPOSITORY.captures(s.trim()) else {
            exn::bail!(ErrorKind::InvalidRepository(s.to_string()));
        };
        Ok(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }
}
impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An object as it currently exists in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    /// Transport text, possibly wrapped across several lines.
    pub content: String,
    pub token: Token,
}

/// Outcome of a read. Absence is an expected answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(StoredObject),
    NotFound,
}

/// A single object write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub path: String,
    pub branch: String,
    /// Transport text.
    pub content: String,
    /// Human-readable change message recorded in the store's history.
    pub message: String,
    /// `None` creates a new object; `Some` updates the object only if it is
    /// still at that version.
    pub expected: Option<Token>,
}
impl WriteRequest {
    pub fn create(
        path: impl Into<String>,
        branch: impl Into<String>,
        content: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            branch: branch.into(),
            content: content.into(),
            message: message.into(),
            expected: None,
        }
    }

    pub fn expecting(mut self, token: impl Into<Option<Token>>) -> Self {
        self.expected = token.into();
        self
    }
}

/// A successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub path: String,
    /// New version token. `None` when nothing was actually written (dry run).
    pub token: Option<Token>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cookiesquad/site", "cookiesquad", "site")]
    #[case("  Some_Org/my.repo-2  ", "Some_Org", "my.repo-2")]
    fn test_repository_parse(#[case] input: &str, #[case] owner: &str, #[case] name: &str) {
        let repository: Repository = input.parse().unwrap();
        assert_eq!(repository.owner(), owner);
        assert_eq!(repository.name(), name);
        assert_eq!(repository.to_string(), format!("{owner}/{name}"));
    }

    #[rstest]
    #[case("")]
    #[case("justone")]
    #[case("a/b/c")]
    #[case("owner/")]
    #[case("/repo")]
    #[case("own er/repo")]
    fn test_repository_parse_invalid(#[case] input: &str) {
        let err = input.parse::<Repository>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidRepository(_)));
    }

    #[test]
    fn test_credential_is_redacted() {
        let credential = Credential::new(" ghp_secret \n");
        assert_eq!(credential.expose(), "ghp_secret");
        assert!(!format!("{credential:?}").contains("ghp_secret"));
        assert!(Credential::new("   ").is_empty());
    }

    #[test]
    fn test_write_request_builder() {
        let request = WriteRequest::create("a.jpg", "main", "Zm9v", "msg");
        assert_eq!(request.expected, None);
        let request = request.expecting(Token::new("abc"));
        assert_eq!(request.expected, Some(Token::new("abc")));
    }
}
