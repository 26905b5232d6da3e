pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::ContentStore;
pub use crate::models::{Committed, Credential, Lookup, Repository, StoredObject, Token, WriteRequest};
pub use crate::path::validate as validate_path;
pub use reqwest::Url;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ContentStore + Send + Sync>;
