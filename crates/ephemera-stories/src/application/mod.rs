//! Application layer for stories.

pub mod store;
