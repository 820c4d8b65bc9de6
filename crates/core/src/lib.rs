//! Core types for the Resona persistence layer
//!
//! This crate defines the foundational pieces shared by every layer of the
//! store:
//! - Error: error taxonomy and `Result` alias
//! - keys: the colon-delimited key layout and its validation rules
//! - Document: the schema-free JSON document type and typed codec helpers
//! - time: epoch-millisecond clock for TTL bookkeeping

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod keys;
pub mod time;

pub use document::{decode_text, encode_text, from_document, to_document, Document};
pub use error::{Error, Result};
pub use keys::{validate_key, KeyError};
