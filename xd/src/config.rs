//! Crossdispatch configuration types and loading

use eyre::{Context, Result};
use keystore::{FileStore, KeyValueStore, MemoryStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::channel::Side;
use crate::scheduler::{Binding, FAST_LANE_MS, Mode, default_bindings};

/// Main crossdispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which end of the bridge this process is
    pub side: Side,

    /// Scheduling backend, fixed for the life of the process
    pub mode: Mode,

    /// Shared store configuration
    pub store: StoreConfig,

    /// Threaded backend configuration
    pub threaded: ThreadedConfig,

    /// Cooperative lanes
    pub bindings: Vec<Binding>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            side: Side::Py,
            mode: Mode::Cooperative,
            store: StoreConfig::default(),
            threaded: ThreadedConfig::default(),
            bindings: default_bindings(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.threaded.interval_ms == 0 {
            return Err(eyre::eyre!("threaded.interval-ms must be greater than zero"));
        }

        for (i, binding) in self.bindings.iter().enumerate() {
            if binding.period_ms == 0 {
                return Err(eyre::eyre!(
                    "bindings[{}] ({:?} on {}) has a zero period-ms",
                    i,
                    binding.role,
                    binding.address
                ));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// An explicit path must load and validate. Otherwise the first candidate
    /// from [`Config::search_paths`] that does wins; broken candidates are
    /// logged and skipped.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!(path = %candidate.display(), error = %e, "Skipping config file"),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Project-local `.crossdispatch.yml`, then the user config directory
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".crossdispatch.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("crossdispatch").join("crossdispatch.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        tracing::info!(path = %path.display(), side = %config.side, mode = %config.mode, "Loaded config");
        Ok(config)
    }
}

/// Store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process only; both sides must live in this process
    Memory,
    /// JSON file shared between processes
    #[default]
    File,
}

/// Shared store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Path of the store document (file backend)
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolved store document path
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(FileStore::default_path)
    }

    /// Open the configured backend
    pub fn open(&self) -> Result<Arc<dyn KeyValueStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::File => {
                let path = self.resolved_path();
                let store =
                    FileStore::open(&path).context(format!("Failed to open store at {}", path.display()))?;
                Ok(Arc::new(store))
            }
        }
    }
}

/// Threaded backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadedConfig {
    /// Sleep between loop iterations in milliseconds
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,
}

impl Default for ThreadedConfig {
    fn default() -> Self {
        Self {
            interval_ms: FAST_LANE_MS,
        }
    }
}

impl ThreadedConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
