//! Ephemeral records: wallet-auth sessions and login nonces
//!
//! Unlike the durable entities, these are written with an explicit expiry
//! horizon and disappear on their own — no delete required. Sessions live
//! an hour; login nonces (the one-time challenge a wallet signs) live ten
//! minutes and are consumed on first read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use resona_core::{from_document, keys, to_document, Document, Result};
use resona_engine::{TieredStore, EPHEMERAL_TTL, SESSION_TTL};

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token, also the record key suffix
    pub token: String,
    /// Authenticated user's id
    pub user_id: String,
    /// Wallet the session was proven with
    pub wallet: String,
    /// Issue time; expiry is enforced by the store, not this field
    pub issued_at: DateTime<Utc>,
}

/// Store facade for sessions and nonces
pub struct SessionStore {
    store: Arc<TieredStore>,
}

impl SessionStore {
    /// Create a facade over a shared store handle
    pub fn new(store: Arc<TieredStore>) -> Self {
        Self { store }
    }

    fn session_key(token: &str) -> String {
        keys::record_key("session", token)
    }

    fn nonce_key(wallet: &str) -> String {
        keys::record_key("nonce", &wallet.to_lowercase())
    }

    /// Issue a session with the standard one-hour expiry
    pub fn issue(&self, user_id: &str, wallet: &str) -> Result<Session> {
        self.issue_with_ttl(user_id, wallet, SESSION_TTL)
    }

    /// Issue a session with an explicit expiry
    pub fn issue_with_ttl(&self, user_id: &str, wallet: &str, ttl: Duration) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            wallet: wallet.to_string(),
            issued_at: Utc::now(),
        };
        let doc = to_document(&session)?;
        self.store
            .set(&Self::session_key(&session.token), &doc, Some(ttl))?;
        Ok(session)
    }

    /// Resolve a bearer token; absent once expired or revoked
    pub fn fetch(&self, token: &str) -> Option<Session> {
        let doc = self.store.get(&Self::session_key(token))?;
        match from_document::<Session>(doc) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "malformed session record; treating as absent");
                None
            }
        }
    }

    /// Revoke a session before its expiry
    pub fn revoke(&self, token: &str) -> Result<()> {
        self.store.del(&Self::session_key(token))
    }

    /// Issue the one-time challenge a wallet must sign to log in
    ///
    /// Overwrites any outstanding nonce for the wallet. Expires in ten
    /// minutes if never consumed.
    pub fn issue_nonce(&self, wallet: &str) -> Result<String> {
        let nonce = Uuid::new_v4().simple().to_string();
        self.store.set(
            &Self::nonce_key(wallet),
            &Document::String(nonce.clone()),
            Some(EPHEMERAL_TTL),
        )?;
        Ok(nonce)
    }

    /// Consume the outstanding nonce for a wallet (single use)
    pub fn take_nonce(&self, wallet: &str) -> Option<String> {
        let key = Self::nonce_key(wallet);
        let nonce = self.store.get(&key)?.as_str()?.to_string();
        if let Err(e) = self.store.del(&key) {
            warn!(error = %e, "nonce delete failed; challenge stays live until expiry");
        }
        Some(nonce)
    }
}
