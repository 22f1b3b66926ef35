//! Ephemera: playback state machine and viewer runtime.
//!
//! Decides which story is open, drives autoplay progress, and applies
//! navigation gestures and transient like/heart-burst state. The runtime
//! owns the story store and all timers on a single control task.

pub mod application;
pub mod domain;
