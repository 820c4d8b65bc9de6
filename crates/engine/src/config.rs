//! Store configuration via `resona.toml`
//!
//! The config file lives in the data directory. On first open, a default
//! `resona.toml` is created with commented defaults. To change settings,
//! edit the file and restart — same model as Redis.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use resona_core::{Error, Result};
use resona_storage::CacheOptions;

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "resona.toml";

/// Store configuration loaded from `resona.toml`.
///
/// # Example
///
/// ```toml
/// # Remote key-value service; empty means local-only
/// remote = "redis://127.0.0.1:6379"
///
/// cache_ttl_secs = 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Remote substrate URL (`redis://host:port` or bare `host:port`).
    /// Empty or absent means no primary is attempted.
    #[serde(default)]
    pub remote: Option<String>,
    /// Connect/read/write timeout for the remote substrate, milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Expiry applied to fallback cache entries written without an
    /// explicit TTL, seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of entries in the fallback cache tier.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// How often the background cleaner sweeps expired cache entries,
    /// seconds.
    #[serde(default = "default_cleaner_interval_secs")]
    pub cleaner_interval_secs: u64,
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    4096
}

fn default_cleaner_interval_secs() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            remote: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            cleaner_interval_secs: default_cleaner_interval_secs(),
        }
    }
}

impl StoreConfig {
    /// Load the config from `dir`, creating a commented default file on
    /// first open.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            let text = fs::read_to_string(&path)?;
            toml::from_str(&text).map_err(|e| {
                Error::Config(format!("failed to parse {}: {e}", path.display()))
            })
        } else {
            fs::write(&path, Self::default_toml())?;
            Ok(Self::default())
        }
    }

    /// Socket address of the remote substrate, if one is configured.
    /// Accepts `redis://host:port` and bare `host:port`; empty strings
    /// count as unconfigured.
    pub fn remote_addr(&self) -> Option<String> {
        let remote = self.remote.as_deref()?.trim();
        if remote.is_empty() {
            return None;
        }
        Some(
            remote
                .strip_prefix("redis://")
                .unwrap_or(remote)
                .to_string(),
        )
    }

    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Cleaner interval as a `Duration`
    pub fn cleaner_interval(&self) -> Duration {
        Duration::from_secs(self.cleaner_interval_secs)
    }

    /// Cache tuning for the fallback substrate
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            default_ttl: Duration::from_secs(self.cache_ttl_secs),
            capacity: self.cache_capacity,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Resona store configuration
#
# Remote key-value service ("redis://host:port" or "host:port").
# Leave empty to run on local storage only. If the remote is unreachable
# at startup the store permanently falls back to local storage.
remote = ""

# Timeout for remote connect/read/write, in milliseconds.
connect_timeout_ms = 2000

# Expiry for fallback cache entries written without an explicit TTL,
# in seconds. Durable records stay on disk past this horizon.
cache_ttl_secs = 600

# Maximum number of entries in the fallback cache tier.
cache_capacity = 4096

# How often the background cleaner sweeps expired cache entries, seconds.
cleaner_interval_secs = 30
"#
    }
}
