//! Ephemera KV: local key-value persistence.
//!
//! Stores each key as its own document inside a data directory. Writes go
//! through a temporary sibling file followed by a rename, so a crash never
//! leaves a half-written value behind.

pub mod file_store;
