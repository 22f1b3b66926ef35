//! The playback state machine.
//!
//! Pure and synchronous: every transition takes the current number of live
//! stories and reports what happened as a [`Transition`]. Recording views
//! and running timers is left to the application layer.

use std::time::Duration;

use serde::Serialize;

/// Period of the autoplay timer.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Time a story stays on screen before autoplay advances.
pub const DEFAULT_STORY_DURATION: Duration = Duration::from_secs(3);

/// Horizontal swipe distance that must be exceeded to navigate.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 50.0;

/// How long the heart-burst animation flag stays set.
pub const DEFAULT_HEART_BURST_DURATION: Duration = Duration::from_secs(1);

/// Tunables for playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    /// Autoplay timer period.
    pub tick_interval: Duration,
    /// Autoplay duration of one story.
    pub story_duration: Duration,
    /// Swipe dead-zone half-width.
    pub swipe_threshold: f64,
    /// Heart-burst lifetime.
    pub heart_burst_duration: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            story_duration: DEFAULT_STORY_DURATION,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            heart_burst_duration: DEFAULT_HEART_BURST_DURATION,
        }
    }
}

impl PlaybackSettings {
    /// Number of autoplay ticks that make up one story, at least one.
    #[must_use]
    pub fn ticks_per_story(&self) -> u32 {
        let tick = self.tick_interval.as_millis().max(1);
        let ticks = self.story_duration.as_millis().div_ceil(tick);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}

/// Outcome of a state-machine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A story was (re-)entered at this index with fresh transient state.
    /// The caller records it as viewed and restarts autoplay.
    Entered(usize),
    /// The viewer closed. The caller stops autoplay.
    Closed,
    /// Navigation did not change.
    Unchanged,
}

/// Transient state of an open viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenSession {
    /// Index into the live story sequence.
    pub index: usize,
    /// Autoplay ticks elapsed on the current story.
    pub ticks: u32,
    /// Whether the viewer has liked the current story.
    pub liked: bool,
    /// Whether the heart-burst animation is showing.
    pub heart_burst: bool,
}

impl OpenSession {
    fn at(index: usize) -> Self {
        Self {
            index,
            ticks: 0,
            liked: false,
            heart_burst: false,
        }
    }
}

/// Viewer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No story is open and autoplay is idle.
    #[default]
    Closed,
    /// A story is on screen.
    Open(OpenSession),
}

/// Read-only view of an open session for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Index into the live story sequence.
    pub index: usize,
    /// Autoplay progress, 0–100.
    pub progress: f64,
    /// Like flag for the current story.
    pub liked: bool,
    /// Heart-burst animation flag.
    pub heart_burst: bool,
}

/// The playback state machine.
#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    state: PlaybackState,
    ticks_per_story: u32,
    swipe_threshold: f64,
}

impl PlaybackMachine {
    /// Creates a closed machine.
    #[must_use]
    pub fn new(settings: &PlaybackSettings) -> Self {
        Self {
            state: PlaybackState::Closed,
            ticks_per_story: settings.ticks_per_story(),
            swipe_threshold: settings.swipe_threshold.abs(),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Returns `true` while a story is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, PlaybackState::Open(_))
    }

    /// Returns the open index, if any.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Open(session) => Some(session.index),
            PlaybackState::Closed => None,
        }
    }

    /// Returns the snapshot of the open session, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        match self.state {
            PlaybackState::Open(session) => Some(SessionSnapshot {
                index: session.index,
                progress: (f64::from(session.ticks) * 100.0 / f64::from(self.ticks_per_story))
                    .min(100.0),
                liked: session.liked,
                heart_burst: session.heart_burst,
            }),
            PlaybackState::Closed => None,
        }
    }

    /// Opens the story at `index`. An index without a live story closes
    /// the viewer instead.
    pub fn open(&mut self, index: usize, live_len: usize) -> Transition {
        if index >= live_len {
            return self.close();
        }
        self.state = PlaybackState::Open(OpenSession::at(index));
        Transition::Entered(index)
    }

    /// Advances to the next story, or closes after the last one.
    pub fn next(&mut self, live_len: usize) -> Transition {
        match self.current_index() {
            Some(index) if index + 1 < live_len => self.open(index + 1, live_len),
            Some(_) => self.close(),
            None => Transition::Unchanged,
        }
    }

    /// Steps back to the previous story; stays put on the first one.
    pub fn prev(&mut self, live_len: usize) -> Transition {
        match self.current_index() {
            Some(index) if index > 0 => self.open(index - 1, live_len),
            _ => Transition::Unchanged,
        }
    }

    /// Closes the viewer, discarding all transient state.
    pub fn close(&mut self) -> Transition {
        match self.state {
            PlaybackState::Open(_) => {
                self.state = PlaybackState::Closed;
                Transition::Closed
            }
            PlaybackState::Closed => Transition::Unchanged,
        }
    }

    /// Interprets a horizontal swipe. Negative deltas beyond the threshold
    /// go forward, positive ones go back; anything inside the dead zone is
    /// ignored.
    pub fn swipe(&mut self, delta_x: f64, live_len: usize) -> Transition {
        if delta_x < -self.swipe_threshold {
            self.next(live_len)
        } else if delta_x > self.swipe_threshold {
            self.prev(live_len)
        } else {
            Transition::Unchanged
        }
    }

    /// Advances autoplay by one fixed step, moving on once the story's
    /// duration is used up.
    pub fn tick(&mut self, live_len: usize) -> Transition {
        let PlaybackState::Open(session) = &mut self.state else {
            return Transition::Unchanged;
        };
        session.ticks = session.ticks.saturating_add(1);
        if session.ticks >= self.ticks_per_story {
            return self.next(live_len);
        }
        Transition::Unchanged
    }

    /// Likes the current story and starts the heart burst. Returns `false`
    /// when the viewer is closed.
    pub fn double_tap(&mut self) -> bool {
        match &mut self.state {
            PlaybackState::Open(session) => {
                session.liked = true;
                session.heart_burst = true;
                true
            }
            PlaybackState::Closed => false,
        }
    }

    /// Ends the heart burst.
    pub fn clear_heart_burst(&mut self) {
        if let PlaybackState::Open(session) = &mut self.state {
            session.heart_burst = false;
        }
    }

    /// Flips the like flag, returning the new value.
    pub fn toggle_like(&mut self) -> Option<bool> {
        match &mut self.state {
            PlaybackState::Open(session) => {
                session.liked = !session.liked;
                Some(session.liked)
            }
            PlaybackState::Closed => None,
        }
    }

    /// Re-settles after the open story was deleted: the story that slid into
    /// the same index is shown from the start, or the viewer closes if
    /// nothing is left at that index.
    pub fn after_delete(&mut self, live_len: usize) -> Transition {
        match self.current_index() {
            Some(index) => self.open(index, live_len),
            None => Transition::Unchanged,
        }
    }

    /// Moves the open session to `index` without resetting its transient
    /// state. Used when the same story shifts position in the sequence.
    pub fn retarget(&mut self, index: usize) {
        if let PlaybackState::Open(session) = &mut self.state {
            session.index = index;
        }
    }
}
