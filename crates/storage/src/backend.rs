//! Backend adapter contract
//!
//! Both substrates — the remote key-value service and the local cache plus
//! file mirror — expose the same ten operations. The tiered store owns
//! exactly one `Backend` at a time and callers never learn which one.
//!
//! Every operation returns `Result`; the availability policy (fail-closed
//! reads, loud writes) is applied by the tiered store, not here.

use std::time::Duration;

use resona_core::{Document, Result};

/// Uniform operation surface over a key-value substrate
///
/// Object-safe so the tiered store can hold `Box<dyn Backend>`.
///
/// Semantics shared by all implementations:
/// - `set` with `ttl: None` means "no expiry" for durable records
///   (the local substrate still ages the cache tier, but its file mirror
///   keeps the document)
/// - `del` is idempotent; deleting an absent key is not an error
/// - `incr` creates the key at `amount` if absent
/// - set operations are idempotent per member; enumeration order is
///   unspecified
pub trait Backend: Send + Sync {
    /// Point lookup. `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<Document>>;

    /// Write a document, optionally with an expiry horizon.
    fn set(&self, key: &str, doc: &Document, ttl: Option<Duration>) -> Result<()>;

    /// Remove a key. Absent keys are a no-op success.
    fn del(&self, key: &str) -> Result<()>;

    /// Key presence check.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Add `amount` to the integer at `key`, creating it at `amount` if
    /// absent. Returns the new value.
    fn incr(&self, key: &str, amount: i64) -> Result<i64>;

    /// Add members to the set at `key`. Returns how many were newly added.
    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize>;

    /// Enumerate the set at `key`. Empty for absent keys.
    fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Remove members from the set at `key`. Returns how many were present.
    fn srem(&self, key: &str, members: &[&str]) -> Result<usize>;

    /// Enumerate keys matching a `*`-wildcard pattern. Substrate-dependent
    /// cost; used rarely.
    fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Wipe all data. Used only by test harnesses.
    fn clear(&self) -> Result<()>;
}

/// Shared handles delegate, so a substrate can be owned by the tiered
/// store and observed by a background task at the same time
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> Result<Option<Document>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, doc: &Document, ttl: Option<Duration>) -> Result<()> {
        (**self).set(key, doc, ttl)
    }

    fn del(&self, key: &str) -> Result<()> {
        (**self).del(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn incr(&self, key: &str, amount: i64) -> Result<i64> {
        (**self).incr(key, amount)
    }

    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        (**self).sadd(key, members)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        (**self).smembers(key)
    }

    fn srem(&self, key: &str, members: &[&str]) -> Result<usize> {
        (**self).srem(key, members)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        (**self).keys(pattern)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
