//! Ephemera: media ingestion pipeline.
//!
//! Turns an arbitrary user image into a bounded-resolution JPEG carried
//! as a self-contained data URL, ready to be handed to the story store.

pub mod application;
pub mod domain;
