// Client construction parameters
// Optionally loaded from a TOML file supplied by the caller

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings for building a [`Requestor`](crate::Requestor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Instance base URL, e.g. "https://lemmy.world" (no trailing slash)
    pub instance_url: String,

    /// Propagate failures instead of logging them and returning `None`
    pub raise_exceptions: bool,

    /// Timeout for the nodeinfo fetch at construction
    pub discovery_timeout_secs: u64,

    /// User-Agent sent on every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            raise_exceptions: false,
            discovery_timeout_secs: 2,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into(),
            ..Self::default()
        }
    }

    pub fn raise_exceptions(mut self, raise: bool) -> Self {
        self.raise_exceptions = raise;
        self
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load settings from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
