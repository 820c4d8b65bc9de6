//! Generic entity repository over the tiered store
//!
//! Maps a typed [`Record`] to the key layout and keeps every index
//! membership consistent on mutation. One repository instance per entity
//! kind, all sharing the same `Arc<TieredStore>`.
//!
//! ## Error semantics
//!
//! `save` fails loud only on the primary record write; alias and index
//! maintenance is best-effort and logged. `find_*` and `delete_by_id`
//! never fail: missing, malformed or unreadable data reads as absent, and
//! deleting an absent id is a no-op success.
//!
//! ## Concurrency
//!
//! `save` and `delete_by_id` on the same id are serialized through a
//! per-id lock map, so one writer's index updates cannot interleave with
//! another's on the same record. Different ids proceed concurrently.

use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;
use uuid::Uuid;

use resona_core::{from_document, keys, to_document, Document, Result};
use resona_engine::TieredStore;

use crate::record::Record;

/// Repository for one entity kind
pub struct Repository<R: Record> {
    store: Arc<TieredStore>,
    /// Per-id mutation locks. An entry is dropped when its record is
    /// deleted; a waiter holding a stale `Arc` still serializes correctly
    /// and the next mutation simply recreates the entry.
    locks: DashMap<String, Arc<Mutex<()>>>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Record> Repository<R> {
    /// Create a repository over a shared store handle
    pub fn new(store: Arc<TieredStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            _kind: PhantomData,
        }
    }

    /// The underlying store handle
    pub fn store(&self) -> &Arc<TieredStore> {
        &self.store
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Persist a record and re-apply all of its index memberships
    ///
    /// Assigns an id on first save. The primary record write is the only
    /// fatal step; a failure there leaves the caller responsible for
    /// retry. Alias keys and index sets are updated best-effort after it,
    /// so a partially-indexed record is corrected by its next save.
    ///
    /// Memberships are add-only: moving a record to a new category leaves
    /// the old index entry behind until the record is deleted, matching
    /// the alias-orphaning behavior on rename.
    pub fn save(&self, mut record: R) -> Result<R> {
        if record.id().is_empty() {
            record.set_id(Uuid::new_v4().to_string());
        }
        record.touch();
        let id = record.id().to_string();

        let lock = self.lock_for(&id);
        let _guard = lock.lock();

        let doc = to_document(&record)?;
        self.store.set(&R::record_key(&id), &doc, None)?;

        for (field, value) in record.aliases() {
            let key = keys::alias_key(R::KIND, field, &value);
            if let Err(e) = self
                .store
                .set(&key, &Document::String(id.clone()), None)
            {
                warn!(key = %key, error = %e, "alias write failed");
            }
        }

        let collection = R::collection_key();
        if let Err(e) = self.store.sadd(&collection, &[id.as_str()]) {
            warn!(key = %collection, error = %e, "collection index add failed");
        }

        for dimension in record.dimensions() {
            let key = dimension.index_key(R::KIND);
            if let Err(e) = self.store.sadd(&key, &[id.as_str()]) {
                warn!(key = %key, error = %e, "index add failed");
            }
        }

        for key in record.backlinks() {
            if let Err(e) = self.store.sadd(&key, &[id.as_str()]) {
                warn!(key = %key, error = %e, "backlink add failed");
            }
        }

        Ok(record)
    }

    /// Point lookup; absent when missing or malformed
    pub fn find_by_id(&self, id: &str) -> Option<R> {
        if id.is_empty() {
            return None;
        }
        let doc = self.store.get(&R::record_key(id))?;
        match from_document::<R>(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = R::KIND, id, error = %e, "malformed record; treating as absent");
                None
            }
        }
    }

    /// Resolve an alias field to its record
    pub fn find_by_alias(&self, field: &str, value: &str) -> Option<R> {
        let doc = self.store.get(&keys::alias_key(R::KIND, field, value))?;
        let id = doc.as_str()?.to_string();
        self.find_by_id(&id)
    }

    /// Remove a record and strip it from every index it belongs to
    ///
    /// Returns `true` if a record was found and removed. Deleting an
    /// absent id is a no-op success. Partial failures are logged and not
    /// rolled back: the store favors eventual cleanliness over atomicity.
    pub fn delete_by_id(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }

        let lock = self.lock_for(id);
        let _guard = lock.lock();

        // Load first: memberships are derived from the record's current
        // state. Already gone means already successful.
        let Some(record) = self.find_by_id(id) else {
            return false;
        };

        let mut set_keys = vec![R::collection_key()];
        set_keys.extend(
            record
                .dimensions()
                .iter()
                .map(|dimension| dimension.index_key(R::KIND)),
        );
        set_keys.extend(record.backlinks());
        for key in set_keys {
            if let Err(e) = self.store.srem(&key, &[id]) {
                warn!(key = %key, error = %e, "index remove failed");
            }
        }

        for (field, value) in record.aliases() {
            let key = keys::alias_key(R::KIND, field, &value);
            if let Err(e) = self.store.del(&key) {
                warn!(key = %key, error = %e, "alias delete failed");
            }
        }

        for key in R::scoped_keys(id) {
            if let Err(e) = self.store.del(&key) {
                warn!(key = %key, error = %e, "scoped key delete failed");
            }
        }

        if let Err(e) = self.store.del(&R::record_key(id)) {
            warn!(kind = R::KIND, id, error = %e, "primary record delete failed");
        }

        self.locks.remove(id);
        true
    }

    /// Number of records of this kind, per the global collection index
    pub fn count(&self) -> usize {
        self.store.smembers(&R::collection_key()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Dimension;
    use resona_engine::StoreConfig;
    use serde::Deserialize;
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
    struct Track {
        #[serde(default)]
        id: String,
        title: String,
        category: String,
        #[serde(default)]
        code: String,
    }

    impl Record for Track {
        const KIND: &'static str = "track";

        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }

        fn aliases(&self) -> Vec<(&'static str, String)> {
            if self.code.is_empty() {
                Vec::new()
            } else {
                vec![("code", self.code.clone())]
            }
        }

        fn dimensions(&self) -> Vec<Dimension> {
            vec![Dimension::Category(self.category.clone())]
        }

        fn scoped_keys(id: &str) -> Vec<String> {
            vec![keys::scoped_key("track", id, "plays")]
        }

        fn search_text(&self) -> Vec<String> {
            vec![self.title.clone()]
        }
    }

    fn open_repo() -> (TempDir, Repository<Track>) {
        let dir = TempDir::new().unwrap();
        let store = TieredStore::connect(dir.path(), StoreConfig::default()).unwrap();
        (dir, Repository::new(Arc::new(store)))
    }

    fn track(title: &str, category: &str) -> Track {
        Track {
            id: String::new(),
            title: title.to_string(),
            category: category.to_string(),
            code: String::new(),
        }
    }

    // === Save ===

    #[test]
    fn test_save_assigns_id_and_round_trips() {
        let (_dir, repo) = open_repo();

        let saved = repo.save(track("Aurora", "ambient")).unwrap();
        assert!(!saved.id().is_empty());

        let found = repo.find_by_id(saved.id()).unwrap();
        assert_eq!(found, saved);
    }

    #[test]
    fn test_save_is_idempotent_on_id() {
        let (_dir, repo) = open_repo();

        let saved = repo.save(track("Aurora", "ambient")).unwrap();
        let resaved = repo.save(saved.clone()).unwrap();
        assert_eq!(resaved.id(), saved.id());
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_save_indexes_collection_and_dimensions() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(track("Aurora", "ambient")).unwrap();

        let store = repo.store();
        assert!(store
            .smembers("tracks")
            .contains(&saved.id().to_string()));
        assert!(store
            .smembers("tracks:category:ambient")
            .contains(&saved.id().to_string()));
    }

    #[test]
    fn test_resave_does_not_duplicate_memberships() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(track("Aurora", "ambient")).unwrap();
        repo.save(saved.clone()).unwrap();

        assert_eq!(repo.store().smembers("tracks").len(), 1);
        assert_eq!(repo.store().smembers("tracks:category:ambient").len(), 1);
    }

    // === Aliases ===

    #[test]
    fn test_alias_resolves_to_same_record() {
        let (_dir, repo) = open_repo();
        let mut t = track("Aurora", "ambient");
        t.code = "AUR-1".to_string();
        let saved = repo.save(t).unwrap();

        let by_alias = repo.find_by_alias("code", "AUR-1").unwrap();
        assert_eq!(by_alias, repo.find_by_id(saved.id()).unwrap());
    }

    #[test]
    fn test_orphaned_alias_resolves_to_current_record() {
        let (_dir, repo) = open_repo();
        let mut t = track("Aurora", "ambient");
        t.code = "OLD".to_string();
        let mut saved = repo.save(t).unwrap();

        saved.code = "NEW".to_string();
        repo.save(saved.clone()).unwrap();

        // The old alias key is orphaned, not cleaned up; it still points
        // at the id, which hydrates to the record's current state
        let via_old = repo.find_by_alias("code", "OLD").unwrap();
        assert_eq!(via_old.code, "NEW");
        assert!(repo.find_by_alias("code", "NEW").is_some());
    }

    // === Find ===

    #[test]
    fn test_find_absent_and_empty_id() {
        let (_dir, repo) = open_repo();
        assert!(repo.find_by_id("nope").is_none());
        assert!(repo.find_by_id("").is_none());
        assert!(repo.find_by_alias("code", "nope").is_none());
    }

    #[test]
    fn test_malformed_record_reads_as_absent() {
        let (_dir, repo) = open_repo();
        // A document missing required fields does not deserialize
        repo.store()
            .set("track:bad", &serde_json::json!({ "id": "bad" }), None)
            .unwrap();
        assert!(repo.find_by_id("bad").is_none());
    }

    // === Delete ===

    #[test]
    fn test_delete_strips_every_index() {
        let (_dir, repo) = open_repo();
        let mut t = track("Aurora", "ambient");
        t.code = "AUR-1".to_string();
        let saved = repo.save(t).unwrap();
        let id = saved.id().to_string();

        repo.store()
            .incr(&keys::scoped_key("track", &id, "plays"), 3)
            .unwrap();

        assert!(repo.delete_by_id(&id));

        assert!(repo.find_by_id(&id).is_none());
        assert!(!repo.store().smembers("tracks").contains(&id));
        assert!(!repo
            .store()
            .smembers("tracks:category:ambient")
            .contains(&id));
        assert!(repo.find_by_alias("code", "AUR-1").is_none());
        assert!(repo
            .store()
            .get(&keys::scoped_key("track", &id, "plays"))
            .is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(track("Aurora", "ambient")).unwrap();
        let id = saved.id().to_string();

        assert!(repo.delete_by_id(&id));
        assert!(!repo.delete_by_id(&id));
        assert!(!repo.delete_by_id("never-existed"));
    }

    // === Concurrency ===

    #[test]
    fn test_concurrent_saves_on_one_id_serialize() {
        let (_dir, repo) = open_repo();
        let repo = Arc::new(repo);
        let saved = repo.save(track("Aurora", "ambient")).unwrap();
        let id = saved.id().to_string();

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = Arc::clone(&repo);
            let mut record = saved.clone();
            handles.push(thread::spawn(move || {
                record.title = format!("Aurora v{i}");
                repo.save(record).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // One record, one membership, whatever write won
        assert_eq!(repo.count(), 1);
        assert_eq!(repo.store().smembers("tracks:category:ambient").len(), 1);
        let found = repo.find_by_id(&id).unwrap();
        assert!(found.title.starts_with("Aurora v"));
    }
}
