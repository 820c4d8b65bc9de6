//! The record contract between typed entities and the store
//!
//! A `Record` declares everything the generic repository needs to keep a
//! typed entity and its discoverability in lock-step: its kind, its
//! identifier, the alias fields it can be looked up by, the index
//! dimensions it currently qualifies for, and the auxiliary keys that live
//! and die with it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use resona_core::keys;

/// Who can discover a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed everywhere
    #[default]
    Public,
    /// Reachable by direct link only
    Unlisted,
    /// Owner only
    Private,
}

impl Visibility {
    /// Stable string form used in index keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One index dimension a record can qualify for
///
/// Each dimension maps to a set-valued key enumerating the record ids that
/// share the attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Records belonging to an owner
    Owner(String),
    /// Records in a category
    Category(String),
    /// Records carrying a tag (a record has one dimension per tag)
    Tag(String),
    /// Records in a visibility class
    Visibility(Visibility),
    /// Curated/featured records
    Featured,
}

impl Dimension {
    /// The index set key for this dimension under a record kind
    pub fn index_key(&self, kind: &str) -> String {
        match self {
            Dimension::Owner(owner) => keys::index_key(kind, "owner", owner),
            Dimension::Category(category) => keys::index_key(kind, "category", category),
            Dimension::Tag(tag) => keys::index_key(kind, "tag", tag),
            Dimension::Visibility(visibility) => {
                keys::index_key(kind, "visibility", visibility.as_str())
            }
            Dimension::Featured => keys::flag_key(kind, "featured"),
        }
    }
}

/// A typed entity persisted through the generic repository
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Kind name embedded in every key (`user`, `playlist`, `nft`)
    const KIND: &'static str;

    /// Stable identifier; empty before the first save
    fn id(&self) -> &str;

    /// Assign the identifier generated on first save
    fn set_id(&mut self, id: String);

    /// Stamp mutation time; called on every save
    fn touch(&mut self) {}

    /// Alias fields: unique secondary values resolvable to this record's
    /// id in O(1). `(field name, current value)` pairs.
    fn aliases(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Index dimensions this record currently qualifies for
    fn dimensions(&self) -> Vec<Dimension> {
        Vec::new()
    }

    /// Record-scoped auxiliary keys (relationship sets, counters) deleted
    /// along with the record
    fn scoped_keys(id: &str) -> Vec<String> {
        let _ = id;
        Vec::new()
    }

    /// Set-valued keys outside this record's own namespace that enumerate
    /// it while it exists (e.g. the owning user's playlist set). The
    /// record's id is added on save and removed on delete.
    fn backlinks(&self) -> Vec<String> {
        Vec::new()
    }

    /// Text fields scanned by substring search
    fn search_text(&self) -> Vec<String> {
        Vec::new()
    }

    /// Primary key for an id of this kind
    fn record_key(id: &str) -> String {
        keys::record_key(Self::KIND, id)
    }

    /// Global collection set for this kind
    fn collection_key() -> String {
        keys::collection_key(Self::KIND)
    }
}
