//! Client configuration: defaults, then an optional TOML file, then
//! `CHATMIND_*` environment variables. CLI flags are applied last by the
//! binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ChatmindError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend root, without a trailing slash.
    pub base_url: String,
    /// Bound on a single chat turn.
    pub chat_timeout_secs: u64,
    /// Bound on a whole batch run; batch evaluation takes longer than a turn.
    pub batch_timeout_secs: u64,
    /// Bound on registry, history and model-switch calls.
    pub request_timeout_secs: u64,
    /// Where exports, reports and templates are written.
    pub export_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_timeout_secs: 30,
            batch_timeout_secs: 60,
            request_timeout_secs: 10,
            export_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(s).map_err(|e| ChatmindError::Config(e.to_string()))?;
        config.validated()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ChatmindError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, overlaid with `path` when given, then with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config
            .with_env(|key| std::env::var(key).ok())
            .validated()
    }

    /// Apply `CHATMIND_BASE_URL` / `CHATMIND_EXPORT_DIR` from `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CHATMIND_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(dir) = lookup("CHATMIND_EXPORT_DIR").filter(|v| !v.trim().is_empty()) {
            self.export_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn validated(mut self) -> Result<Self> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ChatmindError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.chat_timeout_secs == 0 || self.batch_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ChatmindError::Config("timeouts must be at least 1 second".into()));
        }
        self.base_url = trimmed;
        Ok(self)
    }
}
