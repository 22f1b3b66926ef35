//! Shared test doubles and utilities for the Ephemera stories engine.

mod clock;
mod fixtures;
mod kv;
mod rng;

pub use clock::{FixedClock, ManualClock};
pub use fixtures::encode_test_png;
pub use kv::{
    FailingKeyValueStore, FlakyReadKeyValueStore, MemoryKeyValueStore, ReadOnlyKeyValueStore,
};
pub use rng::{MockRng, SequenceRng};
