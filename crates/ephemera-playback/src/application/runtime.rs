//! The viewer runtime: a single control task that owns the story viewer
//! and every timer, and processes intents one at a time.
//!
//! Presentation code talks to it through a [`ViewerHandle`]. Each request
//! travels over an `mpsc` channel with a `oneshot` reply, and every state
//! change is published as a [`ViewerSnapshot`] on a `watch` channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ephemera_core::error::StoryError;
use ephemera_media::application::ingest::IngestPipeline;
use ephemera_media::domain::media::{EncodedImagePayload, RawMedia};
use ephemera_stories::domain::story::{Story, StoryMetadata};

use super::timers::{OneShotTimer, RecurringTimer};
use super::viewer::StoryViewer;
use crate::domain::session::{PlaybackSettings, SessionSnapshot};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 64;

/// A user intent aimed at the playback state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Open the story at this index.
    Open(usize),
    /// Close the viewer.
    Close,
    /// Go to the next story.
    Advance,
    /// Go to the previous story.
    Retreat,
    /// Horizontal swipe with this delta.
    Swipe(f64),
    /// Like with heart burst.
    DoubleTap,
    /// Flip the like flag.
    LikeToggle,
}

impl Intent {
    /// Stable name used in logs.
    #[must_use]
    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Open(_) => "viewer.open",
            Self::Close => "viewer.close",
            Self::Advance => "viewer.advance",
            Self::Retreat => "viewer.retreat",
            Self::Swipe(_) => "viewer.swipe",
            Self::DoubleTap => "viewer.double_tap",
            Self::LikeToggle => "viewer.like_toggle",
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct ViewerSnapshot {
    /// Live stories, oldest first.
    pub stories: Arc<[Story]>,
    /// The open session, if any.
    pub session: Option<SessionSnapshot>,
    /// Whether the autoplay timer is running.
    pub autoplay_running: bool,
}

impl ViewerSnapshot {
    /// Returns up to `limit` of the newest stories, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<Story> {
        self.stories.iter().rev().take(limit).cloned().collect()
    }
}

#[derive(Debug)]
enum Command {
    Intent(Intent, oneshot::Sender<ViewerSnapshot>),
    Create {
        payload: EncodedImagePayload,
        metadata: StoryMetadata,
        reply: oneshot::Sender<Result<Story, StoryError>>,
    },
    Delete {
        id: String,
        reply: oneshot::Sender<Result<bool, StoryError>>,
    },
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable entry point into a running viewer.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<ViewerSnapshot>,
    pipeline: Arc<IngestPipeline>,
}

impl ViewerHandle {
    /// Returns the most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ViewerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Returns a receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewerSnapshot> {
        self.snapshots.clone()
    }

    /// Returns the ingestion pipeline used for uploads.
    #[must_use]
    pub fn pipeline(&self) -> &IngestPipeline {
        &self.pipeline
    }

    /// Opens the story at `index`.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn open_story(&self, index: usize) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::Open(index)).await
    }

    /// Closes the viewer.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn close_viewer(&self) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::Close).await
    }

    /// Goes to the next story.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn advance(&self) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::Advance).await
    }

    /// Goes to the previous story.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn retreat(&self) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::Retreat).await
    }

    /// Applies a horizontal swipe.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn swipe(&self, delta_x: f64) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::Swipe(delta_x)).await
    }

    /// Likes the current story with a heart burst.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn double_tap(&self) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::DoubleTap).await
    }

    /// Flips the like flag of the current story.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime has stopped.
    pub async fn like_toggle(&self) -> Result<ViewerSnapshot, StoryError> {
        self.intent(Intent::LikeToggle).await
    }

    /// Deletes a story. Callers confirm with the user first.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::PersistenceWrite` if the deletion cannot be
    /// persisted and `StoryError::ViewerUnavailable` if the runtime has
    /// stopped.
    pub async fn request_delete(&self, id: impl Into<String>) -> Result<bool, StoryError> {
        let id = id.into();
        self.request(|reply| Command::Delete { id, reply }).await?
    }

    /// Ingests a raw image on the blocking pool and stores the result as a
    /// new story.
    ///
    /// # Errors
    ///
    /// Returns the ingestion error for unusable input, any
    /// `StoryStore::create` error, or `StoryError::ViewerUnavailable` if the
    /// runtime has stopped.
    pub async fn add_story_from_file(
        &self,
        raw: RawMedia,
        metadata: StoryMetadata,
    ) -> Result<Story, StoryError> {
        let pipeline = Arc::clone(&self.pipeline);
        let payload = tokio::task::spawn_blocking(move || pipeline.ingest(&raw))
            .await
            .map_err(|e| StoryError::DecodeFailure(format!("ingestion task failed: {e}")))??;

        self.request(|reply| Command::Create {
            payload,
            metadata,
            reply,
        })
        .await?
    }

    /// Stops the runtime and its timers.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::ViewerUnavailable` if the runtime had already
    /// stopped.
    pub async fn shutdown(&self) -> Result<(), StoryError> {
        self.request(Command::Shutdown).await
    }

    async fn intent(&self, intent: Intent) -> Result<ViewerSnapshot, StoryError> {
        self.request(|reply| Command::Intent(intent, reply)).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, StoryError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| unavailable())?;
        response.await.map_err(|_| unavailable())
    }
}

fn unavailable() -> StoryError {
    StoryError::ViewerUnavailable("viewer runtime has stopped".to_owned())
}

/// Spawns the viewer runtime on the current tokio runtime. The expiry
/// sweep starts immediately; autoplay starts on the first opened story.
#[must_use]
pub fn spawn_viewer(
    viewer: StoryViewer,
    settings: PlaybackSettings,
    pipeline: IngestPipeline,
) -> (ViewerHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let sweep_interval = viewer.store().settings().sweep_interval;

    let (snapshots_tx, snapshots_rx) = watch::channel(ViewerSnapshot {
        stories: viewer.stories(),
        session: viewer.session(),
        autoplay_running: false,
    });

    let runtime = ViewerRuntime {
        viewer,
        settings,
        commands: commands_rx,
        snapshots: snapshots_tx,
        autoplay: RecurringTimer::new(settings.tick_interval),
        sweep: RecurringTimer::new(sweep_interval),
        heart_burst: OneShotTimer::new(),
    };

    let handle = ViewerHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        pipeline: Arc::new(pipeline),
    };
    (handle, tokio::spawn(runtime.run()))
}

struct ViewerRuntime {
    viewer: StoryViewer,
    settings: PlaybackSettings,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<ViewerSnapshot>,
    autoplay: RecurringTimer,
    sweep: RecurringTimer,
    heart_burst: OneShotTimer,
}

impl ViewerRuntime {
    async fn run(mut self) {
        self.sweep.start();
        info!(
            stories = self.viewer.store().len(),
            sweep_interval_ms = self.sweep.period().as_millis(),
            "viewer runtime started"
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown(reply)) => {
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = self.autoplay.tick() => {
                    let entries = self.viewer.entries();
                    self.viewer.tick().await;
                    self.settle(entries);
                }
                () = self.sweep.tick() => {
                    let entries = self.viewer.entries();
                    if let Err(e) = self.viewer.sweep().await {
                        warn!(error = %e, "expiry sweep failed");
                    }
                    self.settle(entries);
                }
                () = self.heart_burst.fired() => {
                    self.viewer.clear_heart_burst();
                    self.publish();
                }
            }
        }

        self.autoplay.stop();
        self.sweep.stop();
        self.heart_burst.cancel();
        info!("viewer runtime stopped");
    }

    async fn handle(&mut self, command: Command) {
        let entries = self.viewer.entries();
        match command {
            Command::Intent(intent, reply) => {
                debug!(command_type = intent.command_type(), "handling intent");
                self.apply_intent(intent).await;
                self.settle(entries);
                let _ = reply.send(self.snapshot());
            }
            Command::Create {
                payload,
                metadata,
                reply,
            } => {
                debug!(
                    width = payload.width,
                    height = payload.height,
                    "storing ingested image"
                );
                let result = self.viewer.create(payload.data_url, metadata).await;
                self.settle(entries);
                let _ = reply.send(result);
            }
            Command::Delete { id, reply } => {
                let result = self.viewer.request_delete(&id).await;
                self.settle(entries);
                let _ = reply.send(result);
            }
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    async fn apply_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Open(index) => {
                self.viewer.open(index).await;
            }
            Intent::Close => {
                self.viewer.close();
            }
            Intent::Advance => {
                self.viewer.next().await;
            }
            Intent::Retreat => {
                self.viewer.prev().await;
            }
            Intent::Swipe(delta_x) => {
                self.viewer.swipe(delta_x).await;
            }
            Intent::DoubleTap => {
                if self.viewer.double_tap() {
                    self.heart_burst.schedule(self.settings.heart_burst_duration);
                }
            }
            Intent::LikeToggle => {
                self.viewer.toggle_like();
            }
        }
    }

    /// Brings the timers in line with the session and publishes.
    fn settle(&mut self, entries_before: u64) {
        if self.viewer.machine().is_open() {
            if self.viewer.entries() != entries_before {
                self.autoplay.start();
                self.heart_burst.cancel();
            }
        } else {
            self.autoplay.stop();
            self.heart_burst.cancel();
        }
        self.publish();
    }

    fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            stories: self.viewer.stories(),
            session: self.viewer.session(),
            autoplay_running: self.autoplay.is_running(),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
