//! Application layer for media ingestion.

pub mod ingest;
