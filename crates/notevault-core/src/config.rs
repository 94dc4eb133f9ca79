use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
///
/// Loaded from a TOML file under the platform config dir, with sensible
/// defaults when the file (or any section) is missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults.
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("notevault");

        Ok(config_dir.join("config.toml"))
    }
}

/// Where the direct SQLite database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "notevault.db".to_string(),
        }
    }
}

/// The REST fallback endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787/api".to_string(),
            token: None,
        }
    }
}

/// Listing cache tuning. All durations in seconds because TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 100,
            sweep_interval_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn tuning(&self) -> notevault_cache::CacheConfig {
        notevault_cache::CacheConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            max_entries: self.max_entries,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// How listings are fetched and paged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Upper bound on notes fetched per listing query.
    pub fetch_limit: u32,
    /// Notes per page shown to the user.
    pub page_size: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 100,
            page_size: 10,
        }
    }
}
