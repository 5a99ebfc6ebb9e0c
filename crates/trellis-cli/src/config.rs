//! CLI configuration
//!
//! Stored as TOML at `~/.config/trellis/config.toml`:
//!
//! ```toml
//! base_url = "http://localhost:8000/api"
//! timeout_ms = 5000
//! prune_to_viewport = false
//!
//! [graph]
//! show_tags = true
//! repel_force = -400.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use trellis_core::GraphSettings;
use trellis_store::http::DEFAULT_BASE_URL;

/// Default config file location
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trellis")
        .join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API root of the note server
    pub base_url: String,
    /// Bound on every store call
    pub timeout_ms: u64,
    /// Only decorate spans inside the host's viewport
    pub prune_to_viewport: bool,
    /// Default graph view settings
    pub graph: GraphSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 5000,
            prune_to_viewport: false,
            graph: GraphSettings::default(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    ///
    /// Graph sliders outside their range are pulled back into it. A zero
    /// timeout or an over-long search is rejected.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?;

        config
            .check()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        let clamped = config.graph.clamped();
        if clamped != config.graph {
            tracing::warn!(
                "Graph settings in {} are out of range, clamping",
                path.display()
            );
            config.graph = clamped;
        }
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.timeout_ms == 0 {
            bail!("timeout_ms must be greater than zero");
        }
        trellis_core::limits::validate_search(&self.graph.search_query)?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Every settable key, `graph.*` keys included
    pub fn keys() -> Vec<String> {
        let mut keys = Vec::new();
        if let Ok(toml::Value::Table(table)) = toml::Value::try_from(Self::default()) {
            for (key, value) in table {
                match value {
                    toml::Value::Table(inner) => {
                        keys.extend(inner.keys().map(|k| format!("{}.{}", key, k)))
                    }
                    _ => keys.push(key),
                }
            }
        }
        keys
    }

    /// Value of a dotted key such as `timeout_ms` or `graph.show_tags`
    pub fn get(&self, key: &str) -> Option<String> {
        let root = toml::Value::try_from(self).ok()?;
        let value = key.split('.').try_fold(&root, |node, part| node.get(part))?;
        match value {
            toml::Value::String(s) => Some(s.clone()),
            toml::Value::Table(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a dotted key, parsing `raw` as the key's current type
    pub fn set(&mut self, key: &str, raw: &str) -> anyhow::Result<()> {
        let mut root = toml::Value::try_from(&*self)?;

        let mut node = &mut root;
        for part in key.split('.') {
            node = match node.get_mut(part) {
                Some(next) => next,
                None => bail!("Unknown config key: {}", key),
            };
        }

        let value = match &*node {
            toml::Value::String(_) => toml::Value::String(raw.to_string()),
            toml::Value::Boolean(_) => toml::Value::Boolean(
                raw.parse()
                    .with_context(|| format!("{} expects true or false", key))?,
            ),
            toml::Value::Integer(_) => toml::Value::Integer(
                raw.parse()
                    .with_context(|| format!("{} expects an integer", key))?,
            ),
            toml::Value::Float(_) => toml::Value::Float(
                raw.parse()
                    .with_context(|| format!("{} expects a number", key))?,
            ),
            _ => bail!("{} is a section, not a value", key),
        };
        *node = value;

        let updated: Config = root.try_into()?;
        updated.check()?;
        updated.graph.validate()?;
        *self = updated;
        Ok(())
    }
}
