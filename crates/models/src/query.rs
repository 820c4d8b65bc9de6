//! Read paths built on top of the index sets
//!
//! All queries enumerate an index set, then re-enter the repository to
//! hydrate ids into full records. Pagination slices the id list *before*
//! hydrating, so a page costs `limit` point lookups however large the
//! index is. Member ids are sorted first: set enumeration order is
//! unspecified, and sorting gives every page a stable, contiguous slice
//! of one ordering.
//!
//! Ids that hydrate to absent (deleted records still lingering in an
//! index, or malformed documents) are filtered out, so callers never see
//! holes.

use std::cmp::Ordering;

use crate::record::{Dimension, Record};
use crate::repository::Repository;

impl<R: Record> Repository<R> {
    /// Records in one index dimension, paginated
    ///
    /// Returns at most `limit` records starting `offset` into the
    /// dimension's (sorted) membership.
    pub fn list_by_dimension(&self, dimension: &Dimension, limit: usize, offset: usize) -> Vec<R> {
        self.hydrate_page(&dimension.index_key(R::KIND), limit, offset)
    }

    /// Records in the kind's global collection, paginated
    pub fn list_all(&self, limit: usize, offset: usize) -> Vec<R> {
        self.hydrate_page(&R::collection_key(), limit, offset)
    }

    fn hydrate_page(&self, set_key: &str, limit: usize, offset: usize) -> Vec<R> {
        let mut ids = self.store().smembers(set_key);
        ids.sort();
        ids.into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| self.find_by_id(&id))
            .collect()
    }

    /// Best-effort substring search across the kind's records
    ///
    /// No inverted index exists: this scans the global collection,
    /// hydrates every record, and keeps those whose searchable text
    /// contains the query, case-insensitively. O(n) by design; acceptable
    /// for catalog-sized data.
    pub fn search(&self, query: &str, limit: usize) -> Vec<R> {
        let needle = query.to_lowercase();
        let mut ids = self.store().smembers(&R::collection_key());
        ids.sort();

        let mut found = Vec::new();
        for id in ids {
            if found.len() >= limit {
                break;
            }
            let Some(record) = self.find_by_id(&id) else {
                continue;
            };
            if record
                .search_text()
                .iter()
                .any(|text| text.to_lowercase().contains(&needle))
            {
                found.push(record);
            }
        }
        found
    }

    /// Hydrate a dimension's members (or the whole collection) and sort
    /// with a caller-supplied comparator
    ///
    /// No precomputed sorted index exists; the sort happens client-side
    /// over the hydrated records.
    pub fn sorted_view<F>(&self, dimension: Option<&Dimension>, compare: F, limit: usize) -> Vec<R>
    where
        F: FnMut(&R, &R) -> Ordering,
    {
        let set_key = match dimension {
            Some(dimension) => dimension.index_key(R::KIND),
            None => R::collection_key(),
        };
        let mut records: Vec<R> = self
            .store()
            .smembers(&set_key)
            .into_iter()
            .filter_map(|id| self.find_by_id(&id))
            .collect();
        records.sort_by(compare);
        records.truncate(limit);
        records
    }
}
