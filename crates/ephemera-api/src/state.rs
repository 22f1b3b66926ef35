//! Shared application state.

use std::sync::{Arc, Mutex};

use ephemera_core::clock::Clock;
use ephemera_core::rng::DeterministicRng;
use ephemera_playback::application::runtime::ViewerHandle;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the viewer runtime.
    pub viewer: ViewerHandle,
    /// Clock used to render story ages.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// RNG used for placeholder upload metadata.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        viewer: ViewerHandle,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self { viewer, clock, rng }
    }
}
