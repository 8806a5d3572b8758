//! Per-key debounced remote writes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::remote::RemoteStore;
use crate::storage::StoreKey;

/// Holds back remote writes until a key has been quiet for the delay.
///
/// Scheduling a key again restarts its timer and replaces the pending value,
/// so a burst of edits costs one remote write. Once the timer fires the write
/// runs on its own task and is never cancelled.
pub struct WriteDebouncer {
    remote: Arc<dyn RemoteStore>,
    delay: Duration,
    pending: Arc<DashMap<StoreKey, (u64, JoinHandle<()>)>>,
    generation: AtomicU64,
}

impl WriteDebouncer {
    /// Create a debouncer writing to the remote table.
    pub fn new(remote: Arc<dyn RemoteStore>, delay: Duration) -> Self {
        Self {
            remote,
            delay,
            pending: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Quiet period before a write goes out.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a write, replacing any pending write for the key.
    pub fn schedule(&self, key: StoreKey, value: Value) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let remote = Arc::clone(&self.remote);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            pending.remove_if(&key, |_, (current, _)| *current == generation);
            tokio::spawn(async move {
                match remote.upsert(key, &value).await {
                    Ok(()) => debug!(%key, "remote write done"),
                    Err(e) => warn!(%key, error = %e, "remote write failed, local copy kept"),
                }
            });
        });

        if let Some((_, (_, previous))) = self.pending.remove(&key) {
            previous.abort();
            debug!(%key, "pending remote write replaced");
        }
        self.pending.insert(key, (generation, timer));
    }

    /// Drops the pending write for a key, if any.
    ///
    /// Used when a newer value for the key arrived from the remote table, so
    /// the older local value must not follow it out. Returns true if a write
    /// was pending.
    pub fn cancel(&self, key: StoreKey) -> bool {
        match self.pending.remove(&key) {
            Some((_, (_, timer))) => {
                timer.abort();
                debug!(%key, "pending remote write cancelled");
                true
            }
            None => false,
        }
    }

    /// Keys with a write still waiting for its quiet period.
    #[must_use]
    pub fn pending_keys(&self) -> Vec<StoreKey> {
        let mut keys: Vec<StoreKey> = self
            .pending
            .iter()
            .filter(|entry| !entry.value().1.is_finished())
            .map(|entry| *entry.key())
            .collect();
        keys.sort();
        keys
    }

    /// Returns true if no write is waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending_keys().is_empty()
    }
}

impl Drop for WriteDebouncer {
    fn drop(&mut self) {
        for entry in self.pending.iter() {
            entry.value().1.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::sync::convergence::RemoteChange;
    use crate::sync::error::SyncError;

    const QUIET: Duration = Duration::from_millis(1500);

    #[derive(Default)]
    struct RecordingRemote {
        writes: Mutex<Vec<(StoreKey, Value)>>,
        fail: bool,
    }

    impl RecordingRemote {
        fn writes(&self) -> Vec<(StoreKey, Value)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteStore for RecordingRemote {
        async fn upsert(&self, key: StoreKey, value: &Value) -> Result<(), SyncError> {
            if self.fail {
                return Err(SyncError::remote("connection refused"));
            }
            self.writes.lock().unwrap().push((key, value.clone()));
            Ok(())
        }

        async fn fetch_all(&self) -> Result<Vec<RemoteChange>, SyncError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_last_value() {
        let remote = Arc::new(RecordingRemote::default());
        let debouncer = WriteDebouncer::new(remote.clone(), QUIET);

        for sales in [10, 20, 30] {
            debouncer.schedule(StoreKey::CurrentEntry, json!({ "sales": sales }));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(remote.writes().is_empty());
        assert_eq!(debouncer.pending_keys(), vec![StoreKey::CurrentEntry]);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            remote.writes(),
            vec![(StoreKey::CurrentEntry, json!({ "sales": 30 }))]
        );
        assert!(debouncer.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_debounce_independently() {
        let remote = Arc::new(RecordingRemote::default());
        let debouncer = WriteDebouncer::new(remote.clone(), QUIET);

        debouncer.schedule(StoreKey::Orders, json!([]));
        tokio::time::sleep(Duration::from_millis(1000)).await;
        debouncer.schedule(StoreKey::Debtors, json!([]));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(remote.writes(), vec![(StoreKey::Orders, json!([]))]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(remote.writes().len(), 2);
        assert_eq!(remote.writes()[1].0, StoreKey::Debtors);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_writes_all_go_out() {
        let remote = Arc::new(RecordingRemote::default());
        let debouncer = WriteDebouncer::new(remote.clone(), QUIET);

        debouncer.schedule(StoreKey::Records, json!([1]));
        tokio::time::sleep(Duration::from_secs(2)).await;
        debouncer.schedule(StoreKey::Records, json!([1, 2]));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(
            remote.writes(),
            vec![
                (StoreKey::Records, json!([1])),
                (StoreKey::Records, json!([1, 2]))
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_write_never_goes_out() {
        let remote = Arc::new(RecordingRemote::default());
        let debouncer = WriteDebouncer::new(remote.clone(), QUIET);

        debouncer.schedule(StoreKey::MonthlyReports, json!([{ "net": 0 }]));
        debouncer.schedule(StoreKey::Orders, json!([]));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(debouncer.cancel(StoreKey::MonthlyReports));
        assert!(!debouncer.cancel(StoreKey::Debtors));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(remote.writes(), vec![(StoreKey::Orders, json!([]))]);
        assert!(debouncer.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_dropped() {
        let remote = Arc::new(RecordingRemote {
            fail: true,
            ..RecordingRemote::default()
        });
        let debouncer = WriteDebouncer::new(remote.clone(), QUIET);

        debouncer.schedule(StoreKey::Orders, json!([]));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(remote.writes().is_empty());
        assert!(debouncer.is_idle());
    }
}
