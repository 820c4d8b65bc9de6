//! Music NFTs
//!
//! The catalog entity: a minted (or mint-pending) track with its pinned
//! audio/cover content and listing metadata. Indexed by owner, category,
//! every tag, visibility class and the featured flag; reachable by its
//! on-chain token id once minted. Play counts live in a record-scoped
//! counter key, not the record itself, so recording a play never races a
//! metadata save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resona_core::{keys, Result};

use crate::record::{Dimension, Record, Visibility};
use crate::repository::Repository;

/// A music NFT in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicNft {
    /// Generated identifier; empty until first save
    #[serde(default)]
    pub id: String,
    /// Track title
    pub title: String,
    /// Listing description
    #[serde(default)]
    pub description: String,
    /// Wallet that minted the track
    pub creator: String,
    /// Current owner wallet
    pub owner: String,
    /// Genre bucket (`ambient`, `techno`, ...)
    #[serde(default)]
    pub category: String,
    /// Freeform tags, each indexed
    #[serde(default)]
    pub tags: Vec<String>,
    /// Discoverability class
    #[serde(default)]
    pub visibility: Visibility,
    /// Curated on the front page
    #[serde(default)]
    pub featured: bool,
    /// On-chain token id, set once the mint transaction confirms
    #[serde(default)]
    pub token_id: Option<u64>,
    /// Listing price in wei, kept as a string so u256 values survive JSON
    #[serde(default)]
    pub price_wei: Option<String>,
    /// Pinned audio content CID
    pub audio_cid: String,
    /// Pinned cover art CID
    #[serde(default)]
    pub cover_cid: String,
    /// Track length in seconds
    #[serde(default)]
    pub duration_secs: u32,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Stamped on every save
    pub updated_at: DateTime<Utc>,
}

impl MusicNft {
    /// New unminted track, owned by its creator, pre-save
    pub fn new(
        title: impl Into<String>,
        creator: impl Into<String>,
        audio_cid: impl Into<String>,
    ) -> Self {
        let creator = creator.into();
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.into(),
            description: String::new(),
            owner: creator.clone(),
            creator,
            category: String::new(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            featured: false,
            token_id: None,
            price_wei: None,
            audio_cid: audio_cid.into(),
            cover_cid: String::new(),
            duration_secs: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn plays_key(id: &str) -> String {
        keys::scoped_key("nft", id, "plays")
    }
}

impl Record for MusicNft {
    const KIND: &'static str = "nft";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn aliases(&self) -> Vec<(&'static str, String)> {
        match self.token_id {
            Some(token_id) => vec![("token", token_id.to_string())],
            None => Vec::new(),
        }
    }

    fn dimensions(&self) -> Vec<Dimension> {
        let mut dimensions = vec![
            Dimension::Owner(self.owner.to_lowercase()),
            Dimension::Visibility(self.visibility),
        ];
        if !self.category.is_empty() {
            dimensions.push(Dimension::Category(self.category.clone()));
        }
        for tag in &self.tags {
            dimensions.push(Dimension::Tag(tag.clone()));
        }
        if self.featured {
            dimensions.push(Dimension::Featured);
        }
        dimensions
    }

    fn scoped_keys(id: &str) -> Vec<String> {
        vec![Self::plays_key(id)]
    }

    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.title.clone(), self.description.clone()];
        text.extend(self.tags.iter().cloned());
        text
    }
}

impl Repository<MusicNft> {
    /// Resolve an on-chain token id to its catalog record
    pub fn find_by_token(&self, token_id: u64) -> Option<MusicNft> {
        self.find_by_alias("token", &token_id.to_string())
    }

    /// Tracks currently owned by a wallet, paginated
    pub fn list_by_owner(&self, owner: &str, limit: usize, offset: usize) -> Vec<MusicNft> {
        self.list_by_dimension(&Dimension::Owner(owner.to_lowercase()), limit, offset)
    }

    /// Count one play; creates the counter on first play
    pub fn record_play(&self, id: &str) -> Result<i64> {
        self.store().incr(&MusicNft::plays_key(id), 1)
    }

    /// Total plays for a track; zero when unknown
    pub fn play_count(&self, id: &str) -> i64 {
        self.store()
            .get(&MusicNft::plays_key(id))
            .and_then(|doc| doc.as_i64())
            .unwrap_or(0)
    }

    /// Most-played tracks, hydrated and sorted client-side
    pub fn top_played(&self, limit: usize) -> Vec<MusicNft> {
        let mut entries: Vec<(i64, MusicNft)> = self
            .store()
            .smembers(&MusicNft::collection_key())
            .into_iter()
            .filter_map(|id| self.find_by_id(&id))
            .map(|nft| (self.play_count(&nft.id), nft))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        entries.truncate(limit);
        entries.into_iter().map(|(_, nft)| nft).collect()
    }
}
