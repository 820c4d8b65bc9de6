//! Error types for the Resona persistence layer
//!
//! This module defines all error types used throughout the store.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The error policy (who sees which variant) lives one layer up: read paths
//! log and degrade to absent/empty, write paths propagate. This module only
//! defines the taxonomy.

use crate::keys::KeyError;
use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the persistence layer
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (socket operations, file mirror reads/writes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Wire protocol violation from the remote substrate
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Remote substrate could not be reached at connect time
    #[error("Substrate unreachable at {addr}: {reason}")]
    Unreachable {
        /// Address of the remote substrate
        addr: String,
        /// Why the connection attempt failed
        reason: String,
    },

    /// Key failed validation
    #[error("Invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// Stored document has a different shape than the operation expects
    /// (e.g. incrementing a key that does not hold an integer)
    #[error("Wrong type at key {key:?}: expected {expected}")]
    WrongType {
        /// Key the operation targeted
        key: String,
        /// Document shape the operation requires
        expected: &'static str,
    },

    /// Substrate-level failure (error reply, corrupt mirror file)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
