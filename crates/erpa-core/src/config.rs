use serde::{Deserialize, Serialize};

use crate::error::{ErpaError, Result};

pub const DEFAULT_METHOD_PREFIX: &str = "exim_backend.api";
pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_LOG_FILTER: &str = "warn,backend=info,dispatch=info,pdf_workflow=info,session=info";

/// Client settings, loaded from `config.toml` and overridden by the
/// environment and command line.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_method_prefix")]
    pub method_prefix: String,
    /// Anti-forgery token supplied by the host. Scraped from
    /// `csrf_page_path` when absent.
    #[serde(default)]
    pub csrf_token: Option<String>,
    #[serde(default = "default_csrf_page_path")]
    pub csrf_page_path: String,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_method_prefix() -> String {
    DEFAULT_METHOD_PREFIX.to_string()
}

fn default_csrf_page_path() -> String {
    "/app".to_string()
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            method_prefix: default_method_prefix(),
            csrf_token: None,
            csrf_page_path: default_csrf_page_path(),
            default_limit: default_limit(),
            log_filter: default_log_filter(),
        }
    }
}

impl ClientConfig {
    /// Full URL of a backend method.
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/api/method/{}.{}",
            self.base_url.trim_end_matches('/'),
            self.method_prefix.trim_matches('.'),
            method
        )
    }

    pub fn csrf_page_url(&self) -> String {
        let path = self.csrf_page_path.trim_start_matches('/');
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ErpaError::config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.method_prefix.trim().is_empty() {
            return Err(ErpaError::config("method_prefix must not be empty"));
        }
        if self.default_limit == 0 {
            return Err(ErpaError::config("default_limit must be at least 1"));
        }
        Ok(())
    }
}
