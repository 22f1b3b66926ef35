//! Domain layer for stories.

pub mod ids;
pub mod layout;
pub mod story;
