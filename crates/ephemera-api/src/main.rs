//! Ephemera API server entry point.

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use ephemera_api::config::AppConfig;
use ephemera_api::error::AppError;
use ephemera_api::state::AppState;
use ephemera_core::clock::{Clock, SystemClock};
use ephemera_core::rng::{DeterministicRng, SystemRng};
use ephemera_kv::file_store::FileKeyValueStore;
use ephemera_media::application::ingest::IngestPipeline;
use ephemera_media::domain::media::MediaSettings;
use ephemera_playback::application::runtime::spawn_viewer;
use ephemera_playback::application::viewer::StoryViewer;
use ephemera_playback::domain::session::PlaybackSettings;
use ephemera_stories::application::store::{StoreSettings, StoryStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Ephemera API server");

    let config = AppConfig::from_env()?;
    let addr = config.socket_addr()?;

    // Open the persisted mirror and load live stories.
    let kv = FileKeyValueStore::open(config.data_dir.clone()).await?;
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let mut store = StoryStore::new(
        Arc::new(kv),
        Arc::<dyn Clock + Send + Sync>::clone(&clock),
        Box::new(SystemRng::new()),
        StoreSettings::default(),
    );
    let live = store.load().await?;
    tracing::info!(
        live = live.len(),
        data_dir = %config.data_dir.display(),
        "loaded stories"
    );

    // Start the viewer runtime.
    let playback = PlaybackSettings::default();
    let pipeline = IngestPipeline::new(MediaSettings {
        max_input_bytes: config.max_upload_bytes,
        ..MediaSettings::default()
    });
    let (viewer, runtime) = spawn_viewer(StoryViewer::new(store, &playback), playback, pipeline);

    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));
    let app_state = AppState::new(viewer.clone(), clock, rng);
    let app = ephemera_api::app(app_state, config.max_upload_bytes);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = viewer.shutdown().await {
        tracing::warn!(error = %e, "viewer runtime already stopped");
    }
    if let Err(e) = runtime.await {
        tracing::warn!(error = %e, "viewer runtime task failed");
    }
    tracing::info!("Ephemera API server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
