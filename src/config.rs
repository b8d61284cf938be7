//! Zotero credential loading.
//!
//! Credentials come either from an in-memory map with `username` / `api_key`
//! keys, or from a config file with a nested section:
//!
//! ```yaml
//! zotero:
//!   username: "1234567"
//!   api_key: "abcdef"
//! ```
//!
//! The file format is picked from the extension (YAML, TOML, JSON, ...).

use crate::error::{BibError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Zotero user id and API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoteroCredentials {
    pub username: String,
    pub api_key: String,
}

impl ZoteroCredentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }
}

/// Where credentials are read from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Flat mapping with `username` and `api_key` keys
    Inline(HashMap<String, String>),
    /// Structured config file with a `zotero` section
    File(PathBuf),
}

/// Resolve the credential pair from `source`.
pub fn load_credentials(source: &ConfigSource) -> Result<ZoteroCredentials> {
    match source {
        ConfigSource::Inline(map) => {
            let lookup = |key: &str| {
                map.get(key)
                    .cloned()
                    .ok_or_else(|| BibError::Config(format!("missing key `{}`", key)))
            };
            Ok(ZoteroCredentials {
                username: lookup("username")?,
                api_key: lookup("api_key")?,
            })
        }
        ConfigSource::File(path) => load_credentials_file(path),
    }
}

fn load_credentials_file(path: &Path) -> Result<ZoteroCredentials> {
    debug!(path = %path.display(), "Loading Zotero config");

    let settings = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .build()?;

    let lookup = |key: &str| {
        settings.get_string(key).map_err(|e| match e {
            ::config::ConfigError::NotFound(_) => {
                BibError::Config(format!("missing key `{}` in {}", key, path.display()))
            }
            other => BibError::from(other),
        })
    };

    Ok(ZoteroCredentials {
        username: lookup("zotero.username")?,
        api_key: lookup("zotero.api_key")?,
    })
}

/// Default config location: `~/.config/zotero-bib/config.yaml` on Linux.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("zotero-bib").join("config.yaml"))
        .ok_or_else(|| BibError::Config("Cannot determine config directory".to_string()))
}
