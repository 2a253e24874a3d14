//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use cookiegate_taxonomy::CONSENT_STORAGE_KEY;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// URL of the page enforcement runs against
    pub page_url: String,
    /// Parent domain cookies may have been set on, e.g. `example.com`
    pub cookie_domain: Option<String>,
    /// Key the consent record is stored under
    pub storage_key: String,
    /// JSON rule file replacing the built-in registry
    pub registry_path: Option<PathBuf>,
    /// Analytics measurement id, enables the `ga-disable-<id>` flag
    pub measurement_id: Option<String>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("cookiegate.db"),
            page_url: "http://localhost/".to_string(),
            cookie_domain: None,
            storage_key: CONSENT_STORAGE_KEY.to_string(),
            registry_path: None,
            measurement_id: None,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("CookieGate"))
            .unwrap_or_else(|| PathBuf::from(".cookiegate"))
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(CoreError::Config("storage_key must not be empty".to_string()));
        }
        if self.page_url.trim().is_empty() {
            return Err(CoreError::Config("page_url must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

// Simple dirs implementation for common directories
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
