//! Domain layer for playback.

pub mod session;
