//! Tiered store engine for the Resona persistence layer
//!
//! This crate owns substrate selection and lifecycle:
//! - `StoreConfig`: configuration via `resona.toml` in the data directory
//! - `TieredStore`: attempts the remote substrate once at connect time,
//!   permanently falls back to local storage on failure, and applies the
//!   store's error policy (fail-closed reads, loud writes)
//!
//! Repositories in `resona-models` hold an `Arc<TieredStore>` and are
//! oblivious to which substrate is active.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use store::{Mode, TieredStore, EPHEMERAL_TTL, SESSION_TTL};
