use crate::Result;
use docbar_bus::BusNames;
use docbar_bus::backend::{DEFAULT_INTERFACE, DEFAULT_PATH, DEFAULT_SERVICE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Which daemon method answers a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireShape {
    /// `SimpleQuery` for ids, then one `GetDocumentInfo` per id
    #[default]
    #[serde(alias = "identifiers")]
    Simple,

    /// `Query` with records embedded in the reply
    #[serde(alias = "query")]
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonConfig {
    #[serde(default = "default_service")]
    pub service: String,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_interface")]
    pub interface: String,

    #[serde(default)]
    pub wire_shape: WireShape,

    /// Engine name passed to `Query`
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Engine scope passed to `Query`; empty means the daemon's own index
    #[serde(default)]
    pub scope: String,
}

impl DaemonConfig {
    #[must_use]
    pub fn bus_names(&self) -> BusNames {
        BusNames {
            service: self.service.clone(),
            path: self.path.clone(),
            interface: self.interface.clone(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            path: default_path(),
            interface: default_interface(),
            wire_shape: WireShape::default(),
            engine: default_engine(),
            scope: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Upper bound for the per-query result count
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Quiet period before a typed query is sent
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,

    /// Time after submission at which an incomplete result set is finalized
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_ms: u64,
}

impl SearchConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Clamp a requested result count; zero asks for the configured maximum.
    #[must_use]
    pub fn clamp_max(&self, requested: u32) -> u32 {
        if requested == 0 {
            self.max_results
        } else {
            requested.min(self.max_results)
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            debounce_ms: default_debounce(),
            reply_timeout_ms: default_reply_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    #[serde(default = "default_snippet_max_chars")]
    pub snippet_max_chars: usize,

    /// Show paths under the home directory as `~/...`
    #[serde(default = "default_true")]
    pub tilde_home: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            snippet_max_chars: default_snippet_max_chars(),
            tilde_home: true,
        }
    }
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_engine() -> String {
    "xapian".to_string()
}

fn default_max_results() -> u32 {
    10
}

fn default_debounce() -> u64 {
    1000
}

fn default_reply_timeout() -> u64 {
    5000
}

fn default_snippet_max_chars() -> usize {
    200
}

fn default_true() -> bool {
    true
}
