//! Resona persistence layer — tiered document store for a music-NFT
//! marketplace
//!
//! The store degrades gracefully from a remote key-value service to a
//! local cache + file mirror, and keeps hand-rolled secondary indexes
//! (owner, category, tag, visibility, featured) in lock-step with every
//! record mutation.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use resona::{MusicNft, Repository, TieredStore};
//!
//! // Reads `resona.toml` from the data directory; falls back to local
//! // storage if the remote substrate is unreachable
//! let store = Arc::new(TieredStore::open("./data")?);
//!
//! let nfts: Repository<MusicNft> = Repository::new(Arc::clone(&store));
//! let saved = nfts.save(MusicNft::new("Aurora", "0xabc", "bafybeigdyr"))?;
//! let found = nfts.find_by_id(&saved.id);
//! ```
//!
//! # Architecture
//!
//! Repositories (`resona-models`) sit on the tiered store
//! (`resona-engine`), which owns exactly one backend substrate
//! (`resona-storage`) chosen once at connect time.

pub use resona_core::{Document, Error, KeyError, Result};
pub use resona_engine::{Mode, StoreConfig, TieredStore, EPHEMERAL_TTL, SESSION_TTL};
pub use resona_models::{
    Dimension, MusicNft, Playlist, Record, Repository, Session, SessionStore, User, Visibility,
};
pub use resona_storage::{Backend, CacheOptions, LocalStore, RemoteStore};
