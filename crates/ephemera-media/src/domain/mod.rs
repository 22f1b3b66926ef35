//! Domain layer for media ingestion.

pub mod dimensions;
pub mod media;
