//! Document type for the Resona store
//!
//! The store itself is schema-free: a key maps to a JSON document that is
//! opaque below the repository layer. Entity repositories impose a schema at
//! their boundary by encoding/decoding typed records to and from `Document`.
//!
//! Unknown fields are ignored and missing fields fall back to defaults when
//! decoding, so records written by older builds keep hydrating.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// A stored document. Opaque to the store; typed at the repository boundary.
pub type Document = serde_json::Value;

/// Encode a typed record into a document
pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    Ok(serde_json::to_value(record)?)
}

/// Decode a typed record out of a document
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    Ok(serde_json::from_value(doc)?)
}

/// Render a document as the compact JSON text that travels over the wire
/// and into mirror files
pub fn encode_text(doc: &Document) -> String {
    doc.to_string()
}

/// Parse wire/mirror text back into a document
///
/// Counter keys hold bare integers (`"5"`), which parse as JSON numbers.
/// Text that is not valid JSON is preserved as a string document rather
/// than rejected; the remote substrate is shared with other writers.
pub fn decode_text(text: &str) -> Document {
    serde_json::from_str(text).unwrap_or_else(|_| Document::String(text.to_string()))
}
