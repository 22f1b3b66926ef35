//! Ephemera Core: shared abstractions.
//!
//! This crate defines the traits and types that the ingestion, store and
//! playback crates depend on: time, randomness, persistence and the error
//! taxonomy. It contains no infrastructure code.

pub mod clock;
pub mod error;
pub mod persistence;
pub mod rng;
