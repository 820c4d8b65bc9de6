//! Local substrate: in-process cache plus on-disk file mirror
//!
//! The fallback substrate the tiered store degrades to when the remote
//! service is unreachable. Two tiers:
//!
//! - a bounded in-process cache (`DashMap`) where every entry carries an
//!   expiry horizon — the configured default for durable writes, the
//!   caller's TTL for ephemeral writes
//! - a per-key file mirror under the data directory for durable writes
//!   only, so durable records survive both cache aging and restarts while
//!   ephemeral records genuinely expire
//!
//! Sets and counters are not native primitives here: they are emulated as
//! JSON array / integer documents read-modify-written under a store-level
//! mutex. Cache and expiry index are kept in lock-step under the expiry
//! mutex; reads stay lock-free on the `DashMap`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use resona_core::time::{expiry_from_now, now_millis};
use resona_core::{decode_text, encode_text, Document, Error, Result};

use crate::backend::Backend;
use crate::ttl::ExpiryIndex;

/// Suffix for mirror files
const MIRROR_SUFFIX: &str = ".json";

/// Counter for unique temp-file names during atomic mirror writes
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Tuning for the cache tier
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Expiry horizon applied to cache entries written without an explicit
    /// TTL (durable writes; their mirror file outlives the cache entry)
    pub default_ttl: Duration,
    /// Maximum number of cache entries before eviction kicks in
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(600),
            capacity: 4096,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    doc: Document,
    expires_at: u64,
}

/// Fallback key-value substrate: bounded cache + durable file mirror
pub struct LocalStore {
    dir: PathBuf,
    cache: DashMap<String, CacheEntry>,
    /// Guards every cache mutation so `cache` and `expiry` stay in lock-step
    expiry: Mutex<ExpiryIndex>,
    /// Serializes read-modify-write emulation (sets, counters)
    rmw: Mutex<()>,
    opts: CacheOptions,
}

impl LocalStore {
    /// Open the store over a data directory, creating it if absent
    pub fn open(dir: impl AsRef<Path>, opts: CacheOptions) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: DashMap::new(),
            expiry: Mutex::new(ExpiryIndex::new()),
            rmw: Mutex::new(()),
            opts,
        })
    }

    /// Data directory this store mirrors into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of live (possibly expired, not yet swept) cache entries
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Sweep expired cache entries; returns how many were dropped
    ///
    /// Called by the background cleaner. Mirror files are untouched: only
    /// durable writes are mirrored and those stay readable after their
    /// cache entry ages out.
    pub fn purge_expired(&self) -> usize {
        let now = now_millis();
        let mut index = self.expiry.lock();
        let expired = index.find_expired(now);
        let mut dropped = 0;
        for key in &expired {
            let still_expired = self
                .cache
                .get(key)
                .map(|entry| entry.expires_at <= now)
                .unwrap_or(false);
            if still_expired {
                self.cache.remove(key);
                dropped += 1;
            }
        }
        index.remove_expired(now);
        dropped
    }

    // ========== Cache tier ==========

    fn cache_get(&self, key: &str) -> Option<Document> {
        let entry = self.cache.get(key)?;
        if entry.expires_at > now_millis() {
            Some(entry.doc.clone())
        } else {
            // Expired but not yet swept; report absent, leave removal to
            // the cleaner
            None
        }
    }

    fn cache_insert(&self, key: &str, doc: Document, ttl: Duration) {
        let expires_at = expiry_from_now(ttl);
        let mut index = self.expiry.lock();
        self.evict_if_full(&mut index, key);
        if let Some(old) = self.cache.insert(
            key.to_string(),
            CacheEntry { doc, expires_at },
        ) {
            index.remove(old.expires_at, key);
        }
        index.insert(expires_at, key.to_string());
    }

    fn cache_remove(&self, key: &str) {
        let mut index = self.expiry.lock();
        if let Some((_, entry)) = self.cache.remove(key) {
            index.remove(entry.expires_at, key);
        }
    }

    /// Enforce the capacity bound before an insert of a new key.
    /// Expired entries go first; if the cache is still full an arbitrary
    /// entry is evicted (its mirror file, if any, keeps the document).
    fn evict_if_full(&self, index: &mut ExpiryIndex, incoming: &str) {
        if self.cache.len() < self.opts.capacity || self.cache.contains_key(incoming) {
            return;
        }

        let now = now_millis();
        for key in index.find_expired(now) {
            self.cache.remove(&key);
        }
        index.remove_expired(now);

        while self.cache.len() >= self.opts.capacity {
            let victim = self
                .cache
                .iter()
                .next()
                .map(|entry| (entry.key().clone(), entry.value().expires_at));
            match victim {
                Some((key, expires_at)) => {
                    self.cache.remove(&key);
                    index.remove(expires_at, &key);
                }
                None => break,
            }
        }
    }

    // ========== File mirror ==========

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", encode_file_name(key), MIRROR_SUFFIX))
    }

    fn read_mirror(&self, key: &str) -> Result<Option<Document>> {
        match fs::read_to_string(self.file_path(key)) {
            Ok(text) => Ok(Some(decode_text(&text))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_mirror(&self, key: &str, doc: &Document) -> Result<()> {
        let path = self.file_path(key);
        let tmp = self.dir.join(format!(
            ".tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, encode_text(doc))?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_mirror(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========== Emulation helpers ==========

    /// Read the set at `key` as its JSON-array emulation
    fn read_set(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key)? {
            None => Ok(Vec::new()),
            Some(Document::Array(items)) => {
                let mut members = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Document::String(member) => members.push(member),
                        other => {
                            warn!(key, member = %other, "dropping non-string set member");
                        }
                    }
                }
                Ok(members)
            }
            Some(_) => Err(Error::WrongType {
                key: key.to_string(),
                expected: "array of members",
            }),
        }
    }

    fn write_set(&self, key: &str, members: Vec<String>) -> Result<()> {
        let doc = Document::Array(members.into_iter().map(Document::String).collect());
        self.set(key, &doc, None)
    }
}

impl Backend for LocalStore {
    fn get(&self, key: &str) -> Result<Option<Document>> {
        if let Some(doc) = self.cache_get(key) {
            return Ok(Some(doc));
        }
        match self.read_mirror(key)? {
            Some(doc) => {
                // Repopulate the cache tier on a mirror hit
                self.cache_insert(key, doc.clone(), self.opts.default_ttl);
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, doc: &Document, ttl: Option<Duration>) -> Result<()> {
        match ttl {
            // Ephemeral: cache tier only, so expiry genuinely removes it
            Some(ttl) => {
                self.cache_insert(key, doc.clone(), ttl);
                Ok(())
            }
            // Durable: mirror first, then cache with the default horizon
            None => {
                self.write_mirror(key, doc)?;
                self.cache_insert(key, doc.clone(), self.opts.default_ttl);
                Ok(())
            }
        }
    }

    fn del(&self, key: &str) -> Result<()> {
        self.cache_remove(key);
        self.remove_mirror(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        if self.cache_get(key).is_some() {
            return Ok(true);
        }
        Ok(self.file_path(key).exists())
    }

    fn incr(&self, key: &str, amount: i64) -> Result<i64> {
        let _guard = self.rmw.lock();
        let current = match self.get(key)? {
            None => 0,
            Some(Document::Number(n)) => n.as_i64().ok_or(Error::WrongType {
                key: key.to_string(),
                expected: "integer",
            })?,
            Some(_) => {
                return Err(Error::WrongType {
                    key: key.to_string(),
                    expected: "integer",
                })
            }
        };
        let next = current + amount;
        self.set(key, &Document::from(next), None)?;
        Ok(next)
    }

    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        let _guard = self.rmw.lock();
        let mut current = self.read_set(key)?;
        let mut added = 0;
        for member in members {
            if !current.iter().any(|m| m == member) {
                current.push((*member).to_string());
                added += 1;
            }
        }
        if added > 0 {
            self.write_set(key, current)?;
        }
        Ok(added)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.read_set(key)
    }

    fn srem(&self, key: &str, members: &[&str]) -> Result<usize> {
        let _guard = self.rmw.lock();
        let current = self.read_set(key)?;
        let before = current.len();
        let remaining: Vec<String> = current
            .into_iter()
            .filter(|m| !members.contains(&m.as_str()))
            .collect();
        let removed = before - remaining.len();
        if removed > 0 {
            self.write_set(key, remaining)?;
        }
        Ok(removed)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut matches = std::collections::BTreeSet::new();

        let now = now_millis();
        for entry in self.cache.iter() {
            if entry.value().expires_at > now && glob_match(pattern, entry.key()) {
                matches.insert(entry.key().clone());
            }
        }

        for dir_entry in fs::read_dir(&self.dir)? {
            let name = dir_entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(encoded) = name.strip_suffix(MIRROR_SUFFIX) else {
                continue;
            };
            let Some(key) = decode_file_name(encoded) else {
                warn!(file = name, "skipping mirror file with undecodable name");
                continue;
            };
            if glob_match(pattern, &key) {
                matches.insert(key);
            }
        }

        Ok(matches.into_iter().collect())
    }

    fn clear(&self) -> Result<()> {
        let _rmw = self.rmw.lock();
        let mut index = self.expiry.lock();
        self.cache.clear();
        index.clear();
        drop(index);

        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            let is_mirror = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(MIRROR_SUFFIX))
                .unwrap_or(false);
            if is_mirror {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Encode a key into a filesystem-safe mirror file name
///
/// Alphanumerics plus `- _ .` pass through; every other byte becomes `%XX`.
pub fn encode_file_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Decode a mirror file name back into its key
pub fn decode_file_name(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 3 > bytes.len() {
                return None;
            }
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Match a key against a `*`-wildcard pattern
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];

    if !text.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(offset) => pos += offset + part.len(),
            None => return false,
        }
    }

    last.is_empty() || text[pos..].ends_with(last)
}
