//! Shiftbook sync daemon
//!
//! Loads the local store, pulls the shared table, then merges remote changes
//! as they are notified until interrupted. Without a database section it
//! runs local-only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftbook_core::storage::{KeyValueStore, StorageService, StoreProvider};
use shiftbook_core::sync::{RemoteStore, SyncEngine, SyncError};
use shiftbook_db::{ChangeListener, PgRemoteStore, SystemDataRepository, connect};
use shiftbook_shared::AppConfig;

/// Upper bound on waiting for debounced writes at shutdown.
const DRAIN_LIMIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftbook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    let timezone = config.fiscal.tz()?;

    // Open the local store
    let storage = StorageService::from_provider(StoreProvider::from(&config.store))?;
    info!(provider = storage.provider_name(), "local store ready");
    let store: Arc<dyn KeyValueStore> = Arc::new(storage);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
        }
        shutdown.cancel();
    });

    let Some(database) = &config.database else {
        let engine = SyncEngine::start(store, None, &config.sync, timezone)
            .await
            .with_idle_timeout(config.session.idle_timeout());
        info!(
            records = engine.state().entries.len(),
            "running local-only, no database configured"
        );
        cancel.cancelled().await;
        return Ok(());
    };

    // Connect to the shared table
    let repo = SystemDataRepository::new(connect(database).await?);
    let remote = Arc::new(PgRemoteStore::new(repo.clone()));
    let mut engine = SyncEngine::start(
        store,
        Some(Arc::clone(&remote) as Arc<dyn RemoteStore>),
        &config.sync,
        timezone,
    )
    .await
    .with_idle_timeout(config.session.idle_timeout());

    if let Err(e) = engine.pull(remote.as_ref()).await {
        warn!(error = %e, "initial pull failed, continuing with local state");
    }

    // Feed remote changes into the engine
    let (tx, rx) = mpsc::channel(config.sync.channel_capacity);
    let listener = ChangeListener::connect(&database.url, repo).await?;
    let listener_task = tokio::spawn(listener.run(tx, cancel.clone()));

    let result = engine.run(rx, cancel.clone()).await;
    cancel.cancel();

    drain(&engine).await;

    match result {
        Ok(()) => Ok(()),
        Err(SyncError::FeedClosed) => {
            // The listener only closes the feed when it fails.
            listener_task.await??;
            Err(SyncError::FeedClosed.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Gives pending remote writes a chance to go out before exit.
async fn drain(engine: &SyncEngine) {
    let deadline = tokio::time::Instant::now() + DRAIN_LIMIT;
    while !engine.is_idle() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if !engine.is_idle() {
        warn!("exiting with remote writes still pending");
    }
}
