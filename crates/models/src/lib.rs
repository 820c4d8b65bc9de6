//! Entity models for the Resona persistence layer
//!
//! Typed records and their repositories over the tiered store:
//! - `Record`: the contract between a typed entity and the key layout
//! - `Repository<R>`: save / find / delete with index and alias
//!   maintenance, plus the query layer (pagination, search, sorted views)
//! - `User`, `MusicNft`, `Playlist`: the marketplace entity kinds
//! - `SessionStore`: ephemeral wallet sessions and login nonces

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod nft;
pub mod playlist;
pub mod query;
pub mod record;
pub mod repository;
pub mod session;
pub mod user;

pub use nft::MusicNft;
pub use playlist::Playlist;
pub use record::{Dimension, Record, Visibility};
pub use repository::Repository;
pub use session::{Session, SessionStore};
pub use user::User;
