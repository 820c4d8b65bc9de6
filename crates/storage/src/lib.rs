//! Storage substrates for the Resona persistence layer
//!
//! This crate implements the backend adapter contract over both substrates:
//! - `Backend`: the uniform ten-operation surface
//! - `RemoteStore`: client for the remote RESP key-value service
//! - `LocalStore`: fallback substrate (bounded in-process cache + per-key
//!   file mirror, with sets and counters emulated over single values)
//! - `ExpiryIndex`: expiry-ordered index for the cache tier
//! - `Cleaner`: background sweep thread for expired cache entries
//!
//! The tiered store in `resona-engine` picks one substrate at connect time
//! and owns it for the life of the process.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod cleaner;
pub mod local;
pub mod remote;
pub mod resp;
pub mod testing;
pub mod ttl;

pub use backend::Backend;
pub use cleaner::Cleaner;
pub use local::{CacheOptions, LocalStore};
pub use remote::RemoteStore;
pub use ttl::ExpiryIndex;
