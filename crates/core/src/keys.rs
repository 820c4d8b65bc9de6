//! Key layout and validation for the Resona store
//!
//! Every persisted entity lives under a colon-delimited key namespace. The
//! layout is shared by both substrates and must stay stable: index sets and
//! alias keys are derived from it, and the fallback file mirror names its
//! files after it.
//!
//! | Pattern | Purpose |
//! |---------|---------|
//! | `<kind>:<id>` | primary record |
//! | `<kind>:<field>:<value>` | alias → id (email, username, wallet, token) |
//! | `<kind>s` | global collection set for the kind |
//! | `<kind>s:<dimension>:<value>` | secondary index set (category, tag, ...) |
//! | `<kind>s:<flag>` | flag index set (featured) |
//! | `<kind>:<id>:<relation>` | record-scoped relationship set |
//!
//! ## Validation rules
//!
//! These rules are frozen; both substrates rely on them:
//! - Keys must not be empty
//! - Keys must not contain NUL bytes (\0)
//! - Keys must not exceed `MAX_KEY_BYTES` (512)

use thiserror::Error;

/// Maximum key length in bytes
pub const MAX_KEY_BYTES: usize = 512;

/// Separator between key segments
pub const SEPARATOR: char = ':';

/// Primary record key: `<kind>:<id>`
pub fn record_key(kind: &str, id: &str) -> String {
    format!("{kind}{SEPARATOR}{id}")
}

/// Alias key mapping a unique secondary field to a record id:
/// `<kind>:<field>:<value>`
pub fn alias_key(kind: &str, field: &str, value: &str) -> String {
    format!("{kind}{SEPARATOR}{field}{SEPARATOR}{value}")
}

/// Global collection set for a kind: `<kind>s`
pub fn collection_key(kind: &str) -> String {
    format!("{kind}s")
}

/// Secondary index set: `<kind>s:<dimension>:<value>`
pub fn index_key(kind: &str, dimension: &str, value: &str) -> String {
    format!("{kind}s{SEPARATOR}{dimension}{SEPARATOR}{value}")
}

/// Flag index set with no value component: `<kind>s:<flag>`
pub fn flag_key(kind: &str, flag: &str) -> String {
    format!("{kind}s{SEPARATOR}{flag}")
}

/// Record-scoped relationship set: `<kind>:<id>:<relation>`
pub fn scoped_key(kind: &str, id: &str, relation: &str) -> String {
    format!("{kind}{SEPARATOR}{id}{SEPARATOR}{relation}")
}

/// Validate a key against the frozen key rules
///
/// # Examples
///
/// ```
/// use resona_core::keys::validate_key;
///
/// assert!(validate_key("nft:4f2a").is_ok());
/// assert!(validate_key("playlists:category:ambient").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("a\x00b").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }

    if key.contains('\x00') {
        return Err(KeyError::ContainsNul);
    }

    let len = key.len();
    if len > MAX_KEY_BYTES {
        return Err(KeyError::TooLong {
            actual: len,
            max: MAX_KEY_BYTES,
        });
    }

    Ok(())
}

/// Key validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Key is empty (length 0)
    #[error("Key cannot be empty")]
    Empty,

    /// Key contains NUL byte (\0)
    #[error("Key cannot contain NUL bytes")]
    ContainsNul,

    /// Key exceeds maximum length
    #[error("Key too long: {actual} bytes exceeds maximum {max}")]
    TooLong {
        /// Actual key length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },
}
