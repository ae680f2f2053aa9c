use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable holding the bearer token for the catalog and search
/// endpoints.
pub const API_KEY_ENV: &str = "PRISM_API_KEY";

// ---------------------------------------------------------------------------
// PrismConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.prism/config.json`.
///
/// The API key is **never** written to the JSON file. It is read from
/// [`API_KEY_ENV`] when the config is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    #[serde(skip)]
    pub api_key: Option<String>,

    // Endpoints
    pub catalog_url: String,
    pub search_url: String,

    // Catalog
    pub catalog_cache_ttl_secs: u64,
    pub catalog_search_debounce_ms: u64,

    // Conversation search
    pub local_search_debounce_ms: u64,
    pub server_search_debounce_ms: u64,

    // General
    pub log_level: String,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            catalog_url: "https://openrouter.ai/api/v1/models".into(),
            search_url: "http://localhost:3000/api/conversations/search".into(),
            catalog_cache_ttl_secs: 300,
            catalog_search_debounce_ms: 250,
            local_search_debounce_ms: 300,
            server_search_debounce_ms: 800,
            log_level: "info".into(),
        }
    }
}

impl PrismConfig {
    /// Returns the base config directory: `~/.prism/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".prism"))
    }

    /// Returns the config file path: `~/.prism/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.prism/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Loads config from disk, or creates the default file if missing.
    pub fn load() -> Result<Self> {
        let base = Self::base_dir()?;
        std::fs::create_dir_all(&base)
            .with_context(|| format!("Failed to create directory: {}", base.display()))?;
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            config
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            config
        };
        config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Saves config to disk (the API key is excluded via `#[serde(skip)]`).
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn catalog_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_cache_ttl_secs)
    }

    pub fn catalog_search_debounce(&self) -> Duration {
        Duration::from_millis(self.catalog_search_debounce_ms)
    }

    /// Debounce delays for the conversation search orchestrator.
    pub fn search_timing(&self) -> SearchTiming {
        SearchTiming {
            local: Duration::from_millis(self.local_search_debounce_ms),
            server: Duration::from_millis(self.server_search_debounce_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchTiming
// ---------------------------------------------------------------------------

/// Per-mode debounce delays. Local lookups scan memory, server lookups cost a
/// round-trip, so the server delay is longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTiming {
    pub local: Duration,
    pub server: Duration,
}

impl Default for SearchTiming {
    fn default() -> Self {
        PrismConfig::default().search_timing()
    }
}
