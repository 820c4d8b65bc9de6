//! User accounts
//!
//! A user is keyed by a generated id and reachable through three aliases:
//! wallet address (the identity wallet auth proves), username, and email.
//! Wallet addresses are normalized to lowercase before hitting the key
//! layout so lookups are case-insensitive, the way checksummed addresses
//! arrive from clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resona_core::keys;

use crate::record::{Dimension, Record};
use crate::repository::Repository;

/// A marketplace account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Generated identifier; empty until first save
    #[serde(default)]
    pub id: String,
    /// Wallet address (stored as sent; indexed lowercase)
    pub wallet: String,
    /// Unique handle
    pub username: String,
    /// Optional contact email
    #[serde(default)]
    pub email: String,
    /// Display name shown on profiles
    #[serde(default)]
    pub display_name: String,
    /// Profile bio
    #[serde(default)]
    pub bio: String,
    /// Pinned avatar image CID
    #[serde(default)]
    pub avatar_cid: String,
    /// Curated on the artists page
    #[serde(default)]
    pub featured: bool,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Stamped on every save
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New account for a wallet, pre-save
    pub fn new(wallet: impl Into<String>, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            wallet: wallet.into(),
            username: username.into(),
            email: String::new(),
            display_name: String::new(),
            bio: String::new(),
            avatar_cid: String::new(),
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for User {
    const KIND: &'static str = "user";

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
        let mut aliases = vec![
            ("wallet", self.wallet.to_lowercase()),
            ("username", self.username.clone()),
        ];
        if !self.email.is_empty() {
            aliases.push(("email", self.email.to_lowercase()));
        }
        aliases
    }

    fn dimensions(&self) -> Vec<Dimension> {
        if self.featured {
            vec![Dimension::Featured]
        } else {
            Vec::new()
        }
    }

    fn scoped_keys(id: &str) -> Vec<String> {
        vec![keys::scoped_key("user", id, "playlists")]
    }

    fn search_text(&self) -> Vec<String> {
        vec![
            self.username.clone(),
            self.display_name.clone(),
            self.bio.clone(),
        ]
    }
}

impl Repository<User> {
    /// Look a user up by wallet address (case-insensitive)
    pub fn find_by_wallet(&self, wallet: &str) -> Option<User> {
        self.find_by_alias("wallet", &wallet.to_lowercase())
    }

    /// Look a user up by handle
    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.find_by_alias("username", username)
    }

    /// Look a user up by email (case-insensitive)
    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.find_by_alias("email", &email.to_lowercase())
    }

    /// Ids of the playlists this user owns
    pub fn playlist_ids(&self, user_id: &str) -> Vec<String> {
        let mut ids = self
            .store()
            .smembers(&keys::scoped_key("user", user_id, "playlists"));
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_engine::{StoreConfig, TieredStore};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_repo() -> (TempDir, Repository<User>) {
        let dir = TempDir::new().unwrap();
        let store = TieredStore::connect(dir.path(), StoreConfig::default()).unwrap();
        (dir, Repository::new(Arc::new(store)))
    }

    #[test]
    fn test_round_trip() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(User::new("0xAbC123", "mixgarden")).unwrap();
        assert_eq!(repo.find_by_id(&saved.id).unwrap(), saved);
    }

    #[test]
    fn test_wallet_lookup_is_case_insensitive() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(User::new("0xAbC123", "mixgarden")).unwrap();

        assert_eq!(repo.find_by_wallet("0xABC123").unwrap().id, saved.id);
        assert_eq!(repo.find_by_wallet("0xabc123").unwrap().id, saved.id);
    }

    #[test]
    fn test_username_and_email_lookup() {
        let (_dir, repo) = open_repo();
        let mut user = User::new("0xabc", "mixgarden");
        user.email = "Mix@Garden.io".to_string();
        let saved = repo.save(user).unwrap();

        assert_eq!(repo.find_by_username("mixgarden").unwrap().id, saved.id);
        assert_eq!(repo.find_by_email("mix@garden.io").unwrap().id, saved.id);
        assert!(repo.find_by_username("nobody").is_none());
    }

    #[test]
    fn test_featured_dimension() {
        let (_dir, repo) = open_repo();
        let mut user = User::new("0xabc", "mixgarden");
        user.featured = true;
        let saved = repo.save(user).unwrap();

        assert!(repo
            .store()
            .smembers("users:featured")
            .contains(&saved.id));
    }

    #[test]
    fn test_delete_removes_aliases_and_playlist_set() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(User::new("0xabc", "mixgarden")).unwrap();

        repo.store()
            .sadd(&keys::scoped_key("user", &saved.id, "playlists"), &["p1"])
            .unwrap();

        assert!(repo.delete_by_id(&saved.id));
        assert!(repo.find_by_wallet("0xabc").is_none());
        assert!(repo.find_by_username("mixgarden").is_none());
        assert!(repo.playlist_ids(&saved.id).is_empty());
    }

    #[test]
    fn test_touch_advances_updated_at() {
        let (_dir, repo) = open_repo();
        let saved = repo.save(User::new("0xabc", "mixgarden")).unwrap();
        let resaved = repo.save(saved.clone()).unwrap();
        assert!(resaved.updated_at >= saved.updated_at);
    }
}
