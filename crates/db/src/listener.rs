//! Postgres LISTEN/NOTIFY change feed.
//!
//! The table trigger notifies with the changed key only; the listener
//! fetches the row and forwards it to the sync engine's channel.

use shiftbook_core::sync::{RemoteChange, SyncError};
use sqlx::postgres::PgListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::repositories::SystemDataRepository;

/// Channel the table trigger notifies on.
pub const CHANGE_CHANNEL: &str = "t1t_system_data_changes";

/// Forwards remote row changes into an mpsc channel.
pub struct ChangeListener {
    listener: PgListener,
    repo: SystemDataRepository,
}

impl ChangeListener {
    /// Connects and subscribes to the change channel.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the connection or `LISTEN` fails.
    pub async fn connect(database_url: &str, repo: SystemDataRepository) -> Result<Self, SyncError> {
        let mut listener = PgListener::connect(database_url)
            .await
            .map_err(|e| SyncError::remote(e.to_string()))?;
        listener
            .listen(CHANGE_CHANNEL)
            .await
            .map_err(|e| SyncError::remote(e.to_string()))?;
        info!(channel = CHANGE_CHANNEL, "listening for remote changes");
        Ok(Self { listener, repo })
    }

    /// Forwards changes until cancelled or the receiver is dropped.
    ///
    /// A row that cannot be fetched is skipped; the next notification for
    /// the key carries its latest value anyway.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the connection is lost and cannot be
    /// re-established.
    pub async fn run(
        mut self,
        changes: mpsc::Sender<RemoteChange>,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        loop {
            let notification = tokio::select! {
                () = cancel.cancelled() => {
                    info!("change listener stopping");
                    return Ok(());
                }
                notification = self.listener.recv() => {
                    notification.map_err(|e| SyncError::remote(e.to_string()))?
                }
            };

            let key = notification.payload().to_string();
            let value = match self.repo.get(&key).await {
                Ok(row) => row.and_then(|row| row.value),
                Err(e) => {
                    warn!(%key, error = %e, "cannot fetch changed row");
                    continue;
                }
            };
            debug!(%key, "remote change received");

            if changes.send(RemoteChange { key, value }).await.is_err() {
                info!("change receiver dropped, listener stopping");
                return Ok(());
            }
        }
    }
}
