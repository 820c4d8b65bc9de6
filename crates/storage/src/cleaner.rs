//! Background expiry sweep for the local substrate
//!
//! Runs in a dedicated thread and periodically calls
//! [`LocalStore::purge_expired`] so ephemeral records leave the cache tier
//! without waiting for a read to notice them. Graceful shutdown via an
//! atomic flag; the sleep is chunked so shutdown is responsive.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::local::LocalStore;

/// Background cleanup task over a [`LocalStore`]
pub struct Cleaner {
    store: Arc<LocalStore>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Cleaner {
    /// Create a cleaner sweeping `store` every `interval`
    pub fn new(store: Arc<LocalStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the sweep thread
    ///
    /// Runs until [`Cleaner::shutdown`] is called. The first sweep happens
    /// one interval after start, not immediately.
    pub fn start(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        thread::spawn(move || {
            let chunk = Duration::from_millis(100).min(interval);
            while !shutdown.load(Ordering::Relaxed) {
                let mut elapsed = Duration::ZERO;
                while elapsed < interval {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(chunk);
                    elapsed += chunk;
                }

                let dropped = store.purge_expired();
                if dropped > 0 {
                    debug!(dropped, "swept expired cache entries");
                }
            }
        })
    }

    /// Signal the sweep thread to exit
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::local::CacheOptions;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_cleaner_sweeps_expired_entries() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::open(dir.path(), CacheOptions::default()).unwrap());

        store
            .set("nonce:w", &json!("abc"), Some(Duration::from_millis(20)))
            .unwrap();

        let cleaner = Cleaner::new(Arc::clone(&store), Duration::from_millis(30));
        let handle = cleaner.start();

        // Give the cleaner a couple of intervals to notice the expiry
        thread::sleep(Duration::from_millis(150));
        assert_eq!(store.cache_len(), 0);

        cleaner.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_cleaner_shutdown_is_prompt() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(LocalStore::open(dir.path(), CacheOptions::default()).unwrap());

        let cleaner = Cleaner::new(store, Duration::from_secs(3600));
        let handle = cleaner.start();
        cleaner.shutdown();
        // Must return long before the hour-long interval elapses
        handle.join().unwrap();
    }
}
