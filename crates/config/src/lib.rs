//! Layered configuration for the `gallery` command-line tool.
//!
//! Values are merged from, in increasing priority:
//!
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, chosen by extension),
//! 3. `GALLERY_`-prefixed environment variables (`GALLERY_BRANCH=dev`).
//!
//! The upload credential is deliberately not a configuration key:
//! `GALLERY_TOKEN` is read by the command line, never by this crate.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "GALLERY_";
/// Environment variables sharing the prefix that are not configuration keys.
const ENV_IGNORED: &[&str] = &["token", "config"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Target repository, `owner/name`.
    pub repository: Option<String>,
    pub branch: String,
    /// API root of the content store.
    pub api_url: String,
    /// Repository directory holding one sub-directory per event.
    pub photos_dir: String,
    /// Repository path of the site's event catalog.
    pub catalog: Option<String>,
    /// Public site root, used to print a link to the event page.
    pub site_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: None,
            branch: "main".to_string(),
            api_url: "https://api.github.com".to_string(),
            photos_dir: "assets/photos".to_string(),
            catalog: Some("data/events.json".to_string()),
            site_url: None,
        }
    }
}

impl Config {
    /// Platform default location of the configuration file, e.g.
    /// `~/.config/gallery/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gallery").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the provider stack without extracting it.
    ///
    /// An explicit `file` must exist; the default location is only merged
    /// when present.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.display().to_string())),
            Some(path) => figment = merge_file(figment, path)?,
            None => {
                if let Some(path) = Self::default_path().filter(|path| path.exists()) {
                    figment = merge_file(figment, &path)?;
                } else {
                    tracing::debug!("No configuration file found, using defaults and environment");
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(ENV_IGNORED)))
    }

    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)?.extract().or_raise(|| ErrorKind::Invalid)?;
        config.normalized()
    }

    fn normalized(mut self) -> Result<Self> {
        self.branch = self.branch.trim().to_string();
        if self.branch.is_empty() {
            exn::bail!(ErrorKind::Value {
                key: "branch",
                reason: "must not be empty".to_string(),
            });
        }
        self.photos_dir = self.photos_dir.trim().trim_matches('/').to_string();
        if self.photos_dir.is_empty() {
            exn::bail!(ErrorKind::Value {
                key: "photos_dir",
                reason: "must not be empty".to_string(),
            });
        }
        if self.api_url.trim().is_empty() {
            exn::bail!(ErrorKind::Value {
                key: "api_url",
                reason: "must not be empty".to_string(),
            });
        }
        self.repository = non_empty(self.repository);
        self.catalog = non_empty(self.catalog);
        self.site_url = non_empty(self.site_url).map(|url| url.trim_end_matches('/').to_string());
        Ok(self)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    tracing::debug!(path = %path.display(), "Loading configuration file");
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file_exact(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
        Some("json") => figment.merge(Json::file_exact(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
    })
}
