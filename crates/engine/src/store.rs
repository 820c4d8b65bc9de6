//! Tiered store: one substrate, chosen once at connect time
//!
//! The store attempts the remote substrate at startup and permanently
//! falls back to the local substrate if it cannot be reached. There is no
//! reconnect loop: the transition is one-way for the life of the process,
//! and `mode()` reports which side of it the store landed on. Lifecycle is
//! explicit — construct with [`TieredStore::open`] or
//! [`TieredStore::connect`], share via `Arc`, and call
//! [`TieredStore::disconnect`] (or drop) on shutdown.
//!
//! ## Error policy
//!
//! Reads fail closed: any substrate error is logged and reported as
//! absent/empty, so degraded storage shows up as missing data rather than
//! failures. Writes fail loud and return `Result`; the repository layer
//! decides which of those to propagate and which to swallow.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use resona_core::{validate_key, Document, Result};
use resona_storage::{Backend, Cleaner, LocalStore, RemoteStore};

use crate::config::StoreConfig;

/// Default expiry for ephemeral cache-style records
pub const EPHEMERAL_TTL: Duration = Duration::from_secs(600);

/// Expiry for session records, written explicitly by callers
pub const SESSION_TTL: Duration = Duration::from_secs(3600);

/// Subdirectory of the data directory holding fallback mirror files
const MIRROR_DIR: &str = "mirror";

/// Which substrate the store landed on at connect time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remote substrate reachable and in use
    Primary,
    /// Local cache + file mirror in use (permanent for this process)
    Fallback,
}

/// The tiered document store
///
/// Owns exactly one backend adapter. All repositories hold an
/// `Arc<TieredStore>` and never learn which substrate is active.
pub struct TieredStore {
    backend: Box<dyn Backend>,
    mode: Mode,
    data_dir: PathBuf,
    cleaner: Option<(Cleaner, JoinHandle<()>)>,
}

impl TieredStore {
    /// Open a store using the config file in `data_dir`
    ///
    /// Creates the directory and a default `resona.toml` on first use.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let config = StoreConfig::load_or_create(data_dir)?;
        Self::connect(data_dir, config)
    }

    /// Connect with an explicit config
    ///
    /// Attempts the remote substrate if one is configured; any failure is
    /// logged and the store falls back to local storage. Only a local-open
    /// failure (unusable data directory) is an error.
    pub fn connect(data_dir: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if let Some(addr) = config.remote_addr() {
            match RemoteStore::connect(&addr, config.connect_timeout()) {
                Ok(remote) => {
                    info!(addr = %addr, "connected to primary substrate");
                    return Ok(Self {
                        backend: Box::new(remote),
                        mode: Mode::Primary,
                        data_dir,
                        cleaner: None,
                    });
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "primary substrate unreachable; falling back to local storage");
                }
            }
        }

        let local = Arc::new(LocalStore::open(
            data_dir.join(MIRROR_DIR),
            config.cache_options(),
        )?);
        let cleaner = Cleaner::new(Arc::clone(&local), config.cleaner_interval());
        let handle = cleaner.start();

        Ok(Self {
            backend: Box::new(local),
            mode: Mode::Fallback,
            data_dir,
            cleaner: Some((cleaner, handle)),
        })
    }

    /// Which substrate this store landed on
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Data directory (config file and, in fallback mode, mirror files)
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Shut the store down
    ///
    /// Stops the background cleaner. Dropping the store does the same;
    /// the explicit method exists so shutdown order is visible at call
    /// sites.
    pub fn disconnect(self) {}

    // ========== Reads (fail closed) ==========

    /// Point lookup; absent on any substrate error
    pub fn get(&self, key: &str) -> Option<Document> {
        match self.backend.get(key) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key, error = %e, "read failed; treating as absent");
                None
            }
        }
    }

    /// Presence check; `false` on any substrate error
    pub fn exists(&self, key: &str) -> bool {
        match self.backend.exists(key) {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "exists check failed; treating as absent");
                false
            }
        }
    }

    /// Enumerate an index set; empty on any substrate error
    pub fn smembers(&self, key: &str) -> Vec<String> {
        match self.backend.smembers(key) {
            Ok(members) => members,
            Err(e) => {
                warn!(key, error = %e, "set read failed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Enumerate keys matching a `*` pattern; empty on any substrate error
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        match self.backend.keys(pattern) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern, error = %e, "key scan failed; treating as empty");
                Vec::new()
            }
        }
    }

    // ========== Writes (fail loud) ==========

    /// Write a document; `ttl` of `None` means durable
    pub fn set(&self, key: &str, doc: &Document, ttl: Option<Duration>) -> Result<()> {
        validate_key(key)?;
        self.backend.set(key, doc, ttl)
    }

    /// Remove a key; absent keys are a no-op success
    pub fn del(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.backend.del(key)
    }

    /// Add to the integer at `key`, creating it at `amount`
    pub fn incr(&self, key: &str, amount: i64) -> Result<i64> {
        validate_key(key)?;
        self.backend.incr(key, amount)
    }

    /// Add members to the set at `key`
    pub fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        validate_key(key)?;
        self.backend.sadd(key, members)
    }

    /// Remove members from the set at `key`
    pub fn srem(&self, key: &str, members: &[&str]) -> Result<usize> {
        validate_key(key)?;
        self.backend.srem(key, members)
    }

    /// Wipe all data. Test harnesses only.
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }
}

impl Drop for TieredStore {
    fn drop(&mut self) {
        if let Some((cleaner, handle)) = self.cleaner.take() {
            cleaner.shutdown();
            let _ = handle.join();
        }
    }
}
