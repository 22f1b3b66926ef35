//! Story id generation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use ephemera_core::rng::DeterministicRng;

use super::story::Story;

const SUFFIX_LEN: usize = 9;

/// Issues `story-<epoch ms>-<base36 suffix>` ids that are unique among the
/// live collection and every id this generator has handed out.
#[derive(Debug, Default)]
pub struct StoryIdGenerator {
    issued: HashSet<String>,
}

impl StoryIdGenerator {
    /// Creates a generator with no issued ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id. Collisions get a numeric `-<n>` disambiguator.
    pub fn next_id(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut dyn DeterministicRng,
        existing: &[Story],
    ) -> String {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from_digit(rng.next_u32_range(0, 35), 36).unwrap_or('0'))
            .collect();
        let base = format!("story-{}-{suffix}", now.timestamp_millis());

        let mut candidate = base.clone();
        let mut n = 1u32;
        while self.is_taken(&candidate, existing) {
            candidate = format!("{base}-{n}");
            n += 1;
        }

        self.issued.insert(candidate.clone());
        candidate
    }

    fn is_taken(&self, candidate: &str, existing: &[Story]) -> bool {
        self.issued.contains(candidate) || existing.iter().any(|s| s.id == candidate)
    }
}
