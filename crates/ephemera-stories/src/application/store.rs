//! The story store.
//!
//! Every mutation recomputes the full live collection and replaces the
//! persisted mirror wholesale. The in-memory collection is swapped only
//! after a successful write, with one exception: expired stories leave
//! memory even when the mirror cannot be rewritten.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{debug, info, warn};

use ephemera_core::clock::Clock;
use ephemera_core::error::StoryError;
use ephemera_core::persistence::KeyValueStore;
use ephemera_core::rng::DeterministicRng;

use crate::domain::ids::StoryIdGenerator;
use crate::domain::layout::{self, STORIES_KEY};
use crate::domain::story::{EXPIRY_WINDOW_HOURS, Story, StoryMetadata};

/// Default period of the expiry sweep.
pub const DEFAULT_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Tunables for the story store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Age after which a story is no longer live.
    pub expiry_window: Duration,
    /// Period of the background expiry sweep.
    pub sweep_interval: StdDuration,
    /// How many times a write is attempted before the mutation fails.
    pub write_attempts: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            expiry_window: Duration::hours(EXPIRY_WINDOW_HOURS),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            write_attempts: 2,
        }
    }
}

/// Owns the live story collection and its persisted mirror.
pub struct StoryStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn DeterministicRng>,
    ids: StoryIdGenerator,
    settings: StoreSettings,
    stories: Arc<[Story]>,
}

impl std::fmt::Debug for StoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryStore")
            .field("settings", &self.settings)
            .field("stories", &self.stories.len())
            .finish_non_exhaustive()
    }
}

impl StoryStore {
    /// Creates a store with an empty in-memory collection. Call
    /// [`StoryStore::load`] to pick up persisted stories.
    #[must_use]
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            kv,
            clock,
            rng,
            ids: StoryIdGenerator::new(),
            settings,
            stories: Arc::from(Vec::new()),
        }
    }

    /// Returns the store settings.
    #[must_use]
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Returns the live stories, oldest first.
    #[must_use]
    pub fn stories(&self) -> Arc<[Story]> {
        Arc::clone(&self.stories)
    }

    /// Number of live stories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    /// Returns `true` when no live stories exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Returns the story at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Story> {
        self.stories.get(index)
    }

    /// Returns the position and story with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<(usize, &Story)> {
        self.stories.iter().enumerate().find(|(_, s)| s.id == id)
    }

    /// Reads persisted state, keeps live stories, and rewrites the mirror if
    /// any were dropped.
    ///
    /// A missing or malformed mirror loads as an empty collection. A failed
    /// rewrite is logged; the next sweep writes the mirror again.
    ///
    /// # Errors
    ///
    /// Currently infallible; the `Result` leaves room for stricter stores.
    pub async fn load(&mut self) -> Result<Arc<[Story]>, StoryError> {
        let persisted = match self.read_persisted().await {
            Ok(Some(stories)) => stories,
            Ok(None) => {
                self.stories = Arc::from(Vec::new());
                return Ok(self.stories());
            }
            Err(e) => {
                warn!(error = %e, "story mirror unreadable, loading as empty");
                self.stories = Arc::from(Vec::new());
                return Ok(self.stories());
            }
        };

        let total = persisted.len();
        let live = self.live_only(persisted);
        let dropped = total - live.len();

        if dropped > 0 {
            info!(dropped, remaining = live.len(), "dropping expired stories on load");
            if let Err(e) = self.persist(live.clone()).await {
                warn!(error = %e, "could not rewrite story mirror after load");
                self.stories = Arc::from(live);
            }
        } else {
            self.stories = Arc::from(live);
        }

        Ok(self.stories())
    }

    /// Recomputes the live collection from memory and rewrites the mirror.
    /// Returns how many stories expired.
    ///
    /// Expired stories are dropped from memory even if the write fails.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the mirror cannot be written.
    pub async fn sweep_expired(&mut self) -> Result<usize, StoryError> {
        let current = self.stories.to_vec();
        let total = current.len();
        let live = self.live_only(current);
        let expired = total - live.len();

        if let Err(e) = self.persist(live.clone()).await {
            if expired > 0 {
                warn!(expired, "dropping expired stories from memory despite failed write");
                self.stories = Arc::from(live);
            }
            return Err(e);
        }

        if expired > 0 {
            info!(expired, remaining = self.len(), "swept expired stories");
        } else {
            debug!(remaining = self.len(), "expiry sweep found nothing to drop");
        }
        Ok(expired)
    }

    /// Creates a story from an encoded image payload and appends it.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::Validation` if `image_data` is empty,
    /// `StoryError::PersistenceRead` if the mirror cannot be read, and
    /// `StoryError::PersistenceWrite` if it cannot be written.
    pub async fn create(
        &mut self,
        image_data: String,
        metadata: StoryMetadata,
    ) -> Result<Story, StoryError> {
        if image_data.is_empty() {
            return Err(StoryError::Validation("image data is empty".to_owned()));
        }

        let mut next = self.read_live().await?;
        let now = self.clock.now();
        let id = self.ids.next_id(now, self.rng.as_mut(), &next);

        let story = Story {
            id,
            image_data,
            timestamp: now,
            username: metadata.username,
            avatar: metadata.avatar,
            viewed: false,
            likes: metadata.likes,
            caption: metadata.caption,
        };
        next.push(story.clone());

        self.persist(next).await?;
        info!(story_id = %story.id, total = self.len(), "created story");
        Ok(story)
    }

    /// Marks the story at `index` as viewed. Returns `true` if the flag
    /// changed; an already-viewed story or an out-of-range index is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceRead` if the mirror cannot be read
    /// and `StoryError::PersistenceWrite` if it cannot be written.
    pub async fn mark_viewed(&mut self, index: usize) -> Result<bool, StoryError> {
        let target = self.stories.get(index).map(|s| s.id.clone());
        let mut next = self.read_live().await?;

        let changed = match target
            .as_deref()
            .and_then(|id| next.iter_mut().find(|s| s.id == id))
        {
            Some(story) if !story.viewed => {
                story.viewed = true;
                true
            }
            _ => false,
        };

        self.persist(next).await?;
        if changed {
            debug!(index, story_id = ?target, "marked story viewed");
        }
        Ok(changed)
    }

    /// Removes the story with `id`. Returns `true` if a story was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceRead` if the mirror cannot be read
    /// and `StoryError::PersistenceWrite` if it cannot be written.
    pub async fn delete(&mut self, id: &str) -> Result<bool, StoryError> {
        let current = self.read_live().await?;
        let before = current.len();
        let next: Vec<Story> = current.into_iter().filter(|s| s.id != id).collect();
        let removed = next.len() < before;

        self.persist(next).await?;
        if removed {
            info!(story_id = id, remaining = self.len(), "deleted story");
        }
        Ok(removed)
    }

    fn live_only(&self, stories: Vec<Story>) -> Vec<Story> {
        let now = self.clock.now();
        let window = self.settings.expiry_window;
        stories
            .into_iter()
            .filter(|s| s.is_live_at(now, window))
            .collect()
    }

    /// Base collection for a mutation. A failed read aborts the mutation so
    /// the mirror is never overwritten from a collection it did not hold.
    async fn read_live(&self) -> Result<Vec<Story>, StoryError> {
        let persisted = self.read_persisted().await?.unwrap_or_default();
        Ok(self.live_only(persisted))
    }

    /// Returns `Ok(None)` when the mirror is malformed and `Err` when the
    /// key-value store itself fails.
    async fn read_persisted(&self) -> Result<Option<Vec<Story>>, StoryError> {
        let text = match self.kv.get(STORIES_KEY).await {
            Ok(Some(text)) => text,
            Ok(None) => return Ok(Some(Vec::new())),
            Err(StoryError::PersistenceRead(msg)) => {
                return Err(StoryError::PersistenceRead(msg));
            }
            Err(other) => return Err(StoryError::PersistenceRead(other.to_string())),
        };

        match layout::decode(&text) {
            Ok(stories) => Ok(Some(stories)),
            Err(e) => {
                warn!(error = %e, "story mirror malformed, treating as empty");
                Ok(None)
            }
        }
    }

    async fn persist(&mut self, stories: Vec<Story>) -> Result<(), StoryError> {
        let text = layout::encode(&stories)
            .map_err(|e| StoryError::PersistenceWrite(format!("serialization failed: {e}")))?;

        let attempts = self.settings.write_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.kv.set(STORIES_KEY, &text).await {
                Ok(()) => {
                    self.stories = Arc::from(stories);
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "story mirror write failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(StoryError::PersistenceWrite(msg)) => StoryError::PersistenceWrite(msg),
            Some(other) => StoryError::PersistenceWrite(other.to_string()),
            None => StoryError::PersistenceWrite("no write attempted".to_owned()),
        })
    }
}
