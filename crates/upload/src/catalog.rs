//! The site's event catalog (`data/events.json`).
//!
//! ```json
//! { "events": [ { "id": "spring-bake", "title": "Spring Bake Sale", "date": "2025-04-12" } ] }
//! ```
//!
//! Only `id` and `title` are interpreted; everything else is kept as-is for
//! display. A document without an `events` array is an empty catalog.

use crate::error::{ErrorKind, Operation, Result};
use exn::ResultExt;
use gallery_codec::decode_to_text;
use gallery_store::{Credential, Lookup, Repository, StoreHandle};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    events: Vec<Event>,
}

impl Catalog {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Parse a catalog document. Entries without a string `id` are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let document: Value =
            serde_json::from_str(text).or_raise(|| ErrorKind::Catalog("not valid JSON".to_string()))?;
        let Some(entries) = document.get("events").and_then(Value::as_array) else {
            return Ok(Self::default());
        };
        let events = entries
            .iter()
            .filter_map(|entry| match serde_json::from_value::<Event>(entry.clone()) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(%err, "Ignoring malformed catalog entry");
                    None
                },
            })
            .collect();
        Ok(Self { events })
    }

    /// Read and parse the catalog from the store.
    ///
    /// Returns `None` when the catalog object doesn't exist.
    #[instrument(skip(store, credential), fields(repository = %repository))]
    pub async fn load(
        store: &StoreHandle,
        credential: &Credential,
        repository: &Repository,
        branch: &str,
        path: &str,
    ) -> Result<Option<Self>> {
        let object = match store.read(credential, repository, path, branch).await {
            Ok(Lookup::Found(object)) => object,
            Ok(Lookup::NotFound) => {
                tracing::debug!("Catalog does not exist");
                return Ok(None);
            },
            Err(err) => return Err(ErrorKind::store(err, Operation::Read, path)),
        };
        let text = decode_to_text(&object.content).or_raise(|| ErrorKind::Decode { path: path.to_string() })?;
        let catalog = Self::parse(&text)?;
        tracing::debug!(events = catalog.len(), "Catalog loaded");
        Ok(Some(catalog))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|event| event.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_codec::encode_text;
    use gallery_store::backend::MockBackend;
    use std::sync::Arc;

    const EVENTS: &str = r#"{
        "events": [
            { "id": "spring-bake", "title": "Spring Bake Sale", "date": "2025-04-12" },
            { "id": "summer-fair" },
            { "title": "no id" }
        ]
    }"#;

    #[test]
    fn test_parse() {
        let catalog = Catalog::parse(EVENTS).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), ["spring-bake", "summer-fair"]);
        let event = catalog.get("spring-bake").unwrap();
        assert_eq!(event.title, "Spring Bake Sale");
        assert_eq!(event.extra.get("date"), Some(&Value::from("2025-04-12")));
        assert_eq!(catalog.get("summer-fair").unwrap().title, "");
        assert!(!catalog.contains("winter"));
    }

    #[test]
    fn test_parse_without_events_array() {
        assert!(Catalog::parse("{}").unwrap().is_empty());
        assert!(Catalog::parse(r#"{"events": "soon"}"#).unwrap().is_empty());
        assert!(Catalog::parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = Catalog::parse("{events:").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Catalog(_)));
    }

    #[tokio::test]
    async fn test_load() {
        let store: StoreHandle = Arc::new(MockBackend::with_objects([("data/events.json", encode_text(EVENTS))]));
        let credential = Credential::new("token");
        let repository: Repository = "o/r".parse().unwrap();

        let catalog = Catalog::load(&store, &credential, &repository, "main", "data/events.json").await.unwrap();
        assert_eq!(catalog.map(|c| c.len()), Some(2));

        let missing = Catalog::load(&store, &credential, &repository, "main", "data/other.json").await.unwrap();
        assert_eq!(missing, None);
    }
}
