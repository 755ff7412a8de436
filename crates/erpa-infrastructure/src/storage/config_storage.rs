//! Config file storage.
//!
//! Loads `ClientConfig` from TOML, falls back to defaults when the file is
//! missing or empty, and layers environment overrides on top.

use std::fs;
use std::path::{Path, PathBuf};

use erpa_core::config::ClientConfig;
use erpa_core::error::{ErpaError, Result};

use crate::paths::ErpaPaths;

pub const ENV_BASE_URL: &str = "ERPA_BASE_URL";
pub const ENV_CSRF_TOKEN: &str = "ERPA_CSRF_TOKEN";
pub const ENV_METHOD_PREFIX: &str = "ERPA_METHOD_PREFIX";

/// Handle on one `config.toml`.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a config storage handle for the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at `~/.config/erpa/config.toml`.
    pub fn default_location() -> Result<Self> {
        let path = ErpaPaths::config_file().map_err(|err| ErpaError::config(err.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file. A missing or empty file yields the defaults.
    pub fn load(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigStorage] {} not found, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Loads the file and applies process environment overrides.
    pub fn load_with_env(&self) -> Result<ClientConfig> {
        let config = self.load()?;
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }
}

/// Applies `ERPA_*` overrides read through `lookup`. Empty values are ignored.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(base_url) = read(ENV_BASE_URL) {
        config.base_url = base_url;
    }
    if let Some(token) = read(ENV_CSRF_TOKEN) {
        config.csrf_token = Some(token);
    }
    if let Some(prefix) = read(ENV_METHOD_PREFIX) {
        config.method_prefix = prefix;
    }
    config
}
