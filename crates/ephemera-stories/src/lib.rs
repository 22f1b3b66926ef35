//! Ephemera: story model and story store.
//!
//! Owns the authoritative collection of stories, enforces the 24-hour
//! expiry window, and is the only writer of the persisted mirror.

pub mod application;
pub mod domain;
