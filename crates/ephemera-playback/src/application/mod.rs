//! Application layer for playback.

pub mod runtime;
pub mod timers;
pub mod viewer;
