//! End-to-end persistence properties over the tiered store
//!
//! Exercises the full stack — repositories over the tiered store over a
//! real substrate — in both fallback mode (temp data directory) and
//! primary mode (in-process fake of the remote service), including the
//! equivalence of the two.

mod common;
mod equivalence;
mod properties;
