//! The story viewer: playback state bound to the story store.
//!
//! The state machine knows only indices. The viewer additionally remembers
//! which story id is on screen, so that any change to the live sequence
//! (a sweep, a create that dropped expired stories, an unrelated delete)
//! can move the session along with its story, or close it if the story is
//! gone.

use std::sync::Arc;

use tracing::{debug, warn};

use ephemera_core::error::StoryError;
use ephemera_stories::application::store::StoryStore;
use ephemera_stories::domain::story::{Story, StoryMetadata};

use crate::domain::session::{PlaybackMachine, PlaybackSettings, SessionSnapshot, Transition};

/// Couples a [`PlaybackMachine`] with the [`StoryStore`] it plays from.
#[derive(Debug)]
pub struct StoryViewer {
    store: StoryStore,
    machine: PlaybackMachine,
    current_id: Option<String>,
    entries: u64,
}

impl StoryViewer {
    /// Creates a closed viewer over `store`.
    #[must_use]
    pub fn new(store: StoryStore, settings: &PlaybackSettings) -> Self {
        Self {
            store,
            machine: PlaybackMachine::new(settings),
            current_id: None,
            entries: 0,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &StoryStore {
        &self.store
    }

    /// Returns the state machine.
    #[must_use]
    pub fn machine(&self) -> &PlaybackMachine {
        &self.machine
    }

    /// Returns the live stories.
    #[must_use]
    pub fn stories(&self) -> Arc<[Story]> {
        self.store.stories()
    }

    /// Returns the open session, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionSnapshot> {
        self.machine.snapshot()
    }

    /// Returns the id of the story on screen.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Number of times a story has been entered. Changes whenever autoplay
    /// has to restart from zero.
    #[must_use]
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Opens the story at `index`.
    pub async fn open(&mut self, index: usize) -> Transition {
        let transition = self.machine.open(index, self.store.len());
        self.apply(transition).await
    }

    /// Advances to the next story.
    pub async fn next(&mut self) -> Transition {
        let transition = self.machine.next(self.store.len());
        self.apply(transition).await
    }

    /// Steps back to the previous story.
    pub async fn prev(&mut self) -> Transition {
        let transition = self.machine.prev(self.store.len());
        self.apply(transition).await
    }

    /// Applies a horizontal swipe.
    pub async fn swipe(&mut self, delta_x: f64) -> Transition {
        let transition = self.machine.swipe(delta_x, self.store.len());
        self.apply(transition).await
    }

    /// Advances autoplay by one tick.
    pub async fn tick(&mut self) -> Transition {
        let transition = self.machine.tick(self.store.len());
        self.apply(transition).await
    }

    /// Closes the viewer.
    pub fn close(&mut self) -> Transition {
        self.current_id = None;
        self.machine.close()
    }

    /// Likes the current story and starts the heart burst.
    pub fn double_tap(&mut self) -> bool {
        self.machine.double_tap()
    }

    /// Ends the heart burst.
    pub fn clear_heart_burst(&mut self) {
        self.machine.clear_heart_burst();
    }

    /// Flips the like flag of the current story.
    pub fn toggle_like(&mut self) -> Option<bool> {
        self.machine.toggle_like()
    }

    /// Deletes the story on screen. The story that slides into its place is
    /// shown from the start; if none does, the viewer closes.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the deletion cannot be
    /// persisted. The session is left untouched in that case.
    pub async fn delete_current(&mut self) -> Result<Transition, StoryError> {
        match self.current_id.clone() {
            Some(id) => Ok(self.delete_open(&id).await?.1),
            None => Ok(Transition::Unchanged),
        }
    }

    /// Deletes the story with `id`, which may or may not be on screen.
    /// Returns `true` if a story was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the deletion cannot be
    /// persisted.
    pub async fn request_delete(&mut self, id: &str) -> Result<bool, StoryError> {
        if self.current_id.as_deref() == Some(id) {
            return Ok(self.delete_open(id).await?.0);
        }
        let removed = self.store.delete(id).await?;
        self.reanchor();
        Ok(removed)
    }

    /// Creates a story from an encoded payload.
    ///
    /// # Errors
    ///
    /// Propagates `StoryStore::create` errors.
    pub async fn create(
        &mut self,
        image_data: String,
        metadata: StoryMetadata,
    ) -> Result<Story, StoryError> {
        let story = self.store.create(image_data, metadata).await?;
        self.reanchor();
        Ok(story)
    }

    /// Drops expired stories and moves or closes the session accordingly.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the mirror cannot be written.
    pub async fn sweep(&mut self) -> Result<usize, StoryError> {
        let swept = self.store.sweep_expired().await;
        self.reanchor();
        swept
    }

    async fn delete_open(&mut self, id: &str) -> Result<(bool, Transition), StoryError> {
        let removed = self.store.delete(id).await?;
        if !removed {
            return Ok((false, self.reanchor()));
        }
        let transition = self.machine.after_delete(self.store.len());
        Ok((true, self.apply(transition).await))
    }

    async fn apply(&mut self, transition: Transition) -> Transition {
        match transition {
            Transition::Entered(index) => {
                self.entries += 1;
                self.current_id = self.store.get(index).map(|s| s.id.clone());
                // A failed view record does not undo the navigation.
                if let Err(e) = self.store.mark_viewed(index).await {
                    warn!(index, error = %e, "could not record story view");
                }
                if self.reanchor() == Transition::Closed {
                    return Transition::Closed;
                }
            }
            Transition::Closed => self.current_id = None,
            Transition::Unchanged => {}
        }
        transition
    }

    /// Points the session back at its story after the sequence changed.
    fn reanchor(&mut self) -> Transition {
        let Some(id) = self.current_id.as_deref() else {
            return Transition::Unchanged;
        };
        if let Some((index, _)) = self.store.find(id) {
            if self.machine.current_index() != Some(index) {
                debug!(story_id = id, index, "session follows its story");
                self.machine.retarget(index);
            }
            return Transition::Unchanged;
        }
        debug!(story_id = id, "open story is gone, closing viewer");
        self.close()
    }
}
