//! Playlists
//!
//! A user-owned, ordered collection of track ids. Besides the usual index
//! dimensions, a playlist carries three record-scoped relationship sets —
//! likes, followers, listeners — and is enumerated by its owner's
//! `user:<id>:playlists` set, which is maintained on save and cleaned on
//! delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resona_core::{keys, Result};

use crate::record::{Dimension, Record, Visibility};
use crate::repository::Repository;

/// A play collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Generated identifier; empty until first save
    #[serde(default)]
    pub id: String,
    /// Owning user's id
    pub owner: String,
    /// Playlist title
    pub title: String,
    /// Listing description
    #[serde(default)]
    pub description: String,
    /// Genre bucket
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
    /// Track (NFT) ids in play order
    #[serde(default)]
    pub track_ids: Vec<String>,
    /// Pinned cover art CID
    #[serde(default)]
    pub cover_cid: String,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Stamped on every save
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// New empty playlist for a user, pre-save
    pub fn new(owner: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            owner: owner.into(),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            tags: Vec::new(),
            visibility: Visibility::default(),
            featured: false,
            track_ids: Vec::new(),
            cover_cid: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn likes_key(id: &str) -> String {
        keys::scoped_key("playlist", id, "likes")
    }

    fn followers_key(id: &str) -> String {
        keys::scoped_key("playlist", id, "followers")
    }

    fn listeners_key(id: &str) -> String {
        keys::scoped_key("playlist", id, "listeners")
    }
}

impl Record for Playlist {
    const KIND: &'static str = "playlist";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn dimensions(&self) -> Vec<Dimension> {
        let mut dimensions = vec![
            Dimension::Owner(self.owner.clone()),
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
        vec![
            Self::likes_key(id),
            Self::followers_key(id),
            Self::listeners_key(id),
        ]
    }

    fn backlinks(&self) -> Vec<String> {
        vec![keys::scoped_key("user", &self.owner, "playlists")]
    }

    fn search_text(&self) -> Vec<String> {
        let mut text = vec![self.title.clone(), self.description.clone()];
        text.extend(self.tags.iter().cloned());
        text
    }
}

impl Repository<Playlist> {
    /// Playlists owned by a user, hydrated
    pub fn for_user(&self, user_id: &str) -> Vec<Playlist> {
        let mut ids = self
            .store()
            .smembers(&keys::scoped_key("user", user_id, "playlists"));
        ids.sort();
        ids.into_iter()
            .filter_map(|id| self.find_by_id(&id))
            .collect()
    }

    /// Record a like; `true` if it was new
    pub fn like(&self, playlist_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .store()
            .sadd(&Playlist::likes_key(playlist_id), &[user_id])?
            == 1)
    }

    /// Remove a like; `true` if it was present
    pub fn unlike(&self, playlist_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .store()
            .srem(&Playlist::likes_key(playlist_id), &[user_id])?
            == 1)
    }

    /// Number of likes
    pub fn like_count(&self, playlist_id: &str) -> usize {
        self.store()
            .smembers(&Playlist::likes_key(playlist_id))
            .len()
    }

    /// Follow for update notifications; `true` if new
    pub fn follow(&self, playlist_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .store()
            .sadd(&Playlist::followers_key(playlist_id), &[user_id])?
            == 1)
    }

    /// Stop following; `true` if previously following
    pub fn unfollow(&self, playlist_id: &str, user_id: &str) -> Result<bool> {
        Ok(self
            .store()
            .srem(&Playlist::followers_key(playlist_id), &[user_id])?
            == 1)
    }

    /// User ids following this playlist
    pub fn followers(&self, playlist_id: &str) -> Vec<String> {
        self.store()
            .smembers(&Playlist::followers_key(playlist_id))
    }

    /// Note that a user listened; the set keeps unique listeners
    pub fn record_listener(&self, playlist_id: &str, user_id: &str) -> Result<()> {
        self.store()
            .sadd(&Playlist::listeners_key(playlist_id), &[user_id])?;
        Ok(())
    }

    /// Number of unique listeners
    pub fn listener_count(&self, playlist_id: &str) -> usize {
        self.store()
            .smembers(&Playlist::listeners_key(playlist_id))
            .len()
    }

    /// Append a track if not already present; returns the updated record
    pub fn add_track(&self, playlist_id: &str, nft_id: &str) -> Result<Option<Playlist>> {
        let Some(mut playlist) = self.find_by_id(playlist_id) else {
            return Ok(None);
        };
        if !playlist.track_ids.iter().any(|id| id == nft_id) {
            playlist.track_ids.push(nft_id.to_string());
            playlist = self.save(playlist)?;
        }
        Ok(Some(playlist))
    }

    /// Remove a track; returns the updated record
    pub fn remove_track(&self, playlist_id: &str, nft_id: &str) -> Result<Option<Playlist>> {
        let Some(mut playlist) = self.find_by_id(playlist_id) else {
            return Ok(None);
        };
        let before = playlist.track_ids.len();
        playlist.track_ids.retain(|id| id != nft_id);
        if playlist.track_ids.len() != before {
            playlist = self.save(playlist)?;
        }
        Ok(Some(playlist))
    }
}
