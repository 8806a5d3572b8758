//! The sync engine: application state bound to the local store and the
//! remote table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use shiftbook_shared::config::SyncSettings;
use shiftbook_shared::types::SessionId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::convergence::{MergeOutcome, RemoteChange, merge_remote};
use super::debounce::WriteDebouncer;
use super::error::SyncError;
use super::remote::RemoteStore;

use crate::auth::{IdleWatchdog, SessionState};
use crate::fiscal::{FiscalMonth, local_now};
use crate::reports::{DayFinalized, MonthFinalized};
use crate::state::{AppState, StateError};
use crate::storage::{KeyValueStore, StoreKey};

/// Inactivity threshold unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Owns the application state and keeps both stores in step with it.
///
/// Every change is written to the local store at once. Shared keys are then
/// pushed to the remote table through the debouncer; session keys never
/// leave the machine. Without a remote the engine runs local-only.
///
/// A logged-in session is watched for inactivity; [`run`](Self::run) logs it
/// out once the idle timeout passes without an [`execute`](Self::execute).
pub struct SyncEngine {
    state: AppState,
    session: SessionState,
    store: Arc<dyn KeyValueStore>,
    debouncer: Option<WriteDebouncer>,
    timezone: Tz,
    idle_timeout: Duration,
    watchdog: Option<(SessionId, IdleWatchdog)>,
    idle_tx: mpsc::UnboundedSender<SessionId>,
    idle_rx: mpsc::UnboundedReceiver<SessionId>,
}

impl SyncEngine {
    /// Loads state from the local store.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteStore>>,
        settings: &SyncSettings,
        timezone: Tz,
    ) -> Self {
        let today = local_now(timezone).date_naive();
        let state = AppState::load(store.as_ref(), today).await;
        let debouncer =
            remote.map(|r| WriteDebouncer::new(r, Duration::from_millis(settings.debounce_ms)));
        info!(
            cloud = debouncer.is_some(),
            timezone = %timezone,
            "sync engine started"
        );
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        Self {
            state,
            session: SessionState::new(),
            store,
            debouncer,
            timezone,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            watchdog: None,
            idle_tx,
            idle_rx,
        }
    }

    /// Sets the inactivity threshold for sessions started from now on.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Current application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Current local session.
    #[must_use]
    pub const fn session(&self) -> &SessionState {
        &self.session
    }

    /// Store timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Today's date on the shop's wall clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        local_now(self.timezone).date_naive()
    }

    /// Returns true if no remote write is waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.debouncer.as_ref().is_none_or(WriteDebouncer::is_idle)
    }

    /// Runs an operation and persists the keys it touches.
    ///
    /// Nothing is written when the operation is rejected.
    ///
    /// # Errors
    ///
    /// Returns the operation's error.
    pub async fn execute<R, F>(&mut self, keys: &[StoreKey], op: F) -> Result<R, StateError>
    where
        F: FnOnce(&mut AppState, &mut SessionState) -> Result<R, StateError>,
    {
        let out = op(&mut self.state, &mut self.session)?;
        for &key in keys {
            self.persist(key).await;
        }
        self.watch_session();
        Ok(out)
    }

    /// Counts an operation as activity, and starts or stops the idle
    /// watchdog when the session changed hands.
    fn watch_session(&mut self) {
        if !self.session.is_logged_in() {
            self.watchdog = None;
            return;
        }
        let id = self.session.id();
        match &self.watchdog {
            Some((watched, watchdog)) if *watched == id && !watchdog.is_finished() => {
                watchdog.touch();
            }
            _ => {
                // A signal left over from an earlier watchdog must not end this one.
                while self.idle_rx.try_recv().is_ok() {}
                let idle_tx = self.idle_tx.clone();
                let on_idle = move || {
                    if idle_tx.send(id).is_err() {
                        debug!(session = %id, "engine gone, idle signal dropped");
                    }
                };
                let watchdog =
                    IdleWatchdog::spawn(self.idle_timeout, CancellationToken::new(), on_idle);
                debug!(
                    session = %id,
                    timeout_secs = self.idle_timeout.as_secs(),
                    "idle watchdog started"
                );
                self.watchdog = Some((id, watchdog));
            }
        }
    }

    /// Logs the session out if it is still the one that went idle.
    async fn expire_session(&mut self, id: SessionId) {
        if !self.session.is_logged_in() || self.session.id() != id {
            debug!(session = %id, "stale idle signal ignored");
            return;
        }
        let today = self.today();
        self.state.logout(&mut self.session, today);
        self.watchdog = None;
        info!(session = %id, "idle session logged out");
        self.persist(StoreKey::CurrentEntry).await;
    }

    /// Finalizes the working entry's date, then reconciles closed months.
    ///
    /// # Errors
    ///
    /// See [`AppState::finalize_day`].
    pub async fn finalize_day(&mut self, now: DateTime<Utc>) -> Result<DayFinalized, StateError> {
        let outcome = self
            .execute(
                &[StoreKey::DailyReports, StoreKey::Records, StoreKey::CurrentEntry],
                |state, session| state.finalize_day(session, now),
            )
            .await?;
        self.reconcile(now).await;
        Ok(outcome)
    }

    /// Closes a fiscal month.
    ///
    /// # Errors
    ///
    /// See [`AppState::finalize_month`].
    pub async fn finalize_month(
        &mut self,
        month: FiscalMonth,
        now: &DateTime<Tz>,
    ) -> Result<MonthFinalized, StateError> {
        self.execute(
            &[StoreKey::MonthlyReports, StoreKey::CurrentEntry],
            |state, session| state.finalize_month(session, month, now),
        )
        .await
    }

    /// Loads every remote row into local state, as on startup.
    ///
    /// The kill switch is skipped: a value that predates this session must
    /// not end it. Returns the number of keys that changed.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the table cannot be read; local state
    /// is untouched.
    pub async fn pull(&mut self, remote: &dyn RemoteStore) -> Result<usize, SyncError> {
        let rows = remote.fetch_all().await?;
        let mut changed = 0;
        let mut daily_changed = false;
        let today = self.today();
        for row in rows {
            if row.key == StoreKey::KillSwitch.wire_name() {
                continue;
            }
            if let MergeOutcome::Applied(key) =
                merge_remote(&mut self.state, &mut self.session, row, today)
            {
                self.cancel_pending(key);
                self.store_locally(key).await;
                daily_changed |= key == StoreKey::DailyReports;
                changed += 1;
            }
        }
        if daily_changed {
            self.reconcile(Utc::now()).await;
        }
        info!(changed, "remote state pulled");
        Ok(changed)
    }

    /// Merges one remote change.
    ///
    /// Applied values are stored locally but not pushed back, and a local
    /// write still waiting for the key is dropped. A daily report change
    /// triggers month reconciliation, whose result is pushed.
    pub async fn handle_remote(&mut self, change: RemoteChange) -> MergeOutcome {
        let today = self.today();
        let outcome = merge_remote(&mut self.state, &mut self.session, change, today);
        match outcome {
            MergeOutcome::Applied(key) => {
                self.cancel_pending(key);
                self.store_locally(key).await;
                if key == StoreKey::DailyReports {
                    self.reconcile(Utc::now()).await;
                }
            }
            MergeOutcome::KillSwitch { .. } => {
                self.watchdog = None;
                self.store_locally(StoreKey::CurrentEntry).await;
            }
            _ => {}
        }
        outcome
    }

    /// Consumes the change feed until it closes or the token is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::FeedClosed` if the sender side went away first.
    pub async fn run(
        &mut self,
        mut changes: mpsc::Receiver<RemoteChange>,
        cancel: CancellationToken,
    ) -> Result<(), SyncError> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("sync engine stopping");
                    return Ok(());
                }
                Some(id) = self.idle_rx.recv() => {
                    self.expire_session(id).await;
                }
                change = changes.recv() => match change {
                    Some(change) => {
                        self.handle_remote(change).await;
                    }
                    None => {
                        warn!("change feed closed");
                        return Err(SyncError::FeedClosed);
                    }
                },
            }
        }
    }

    /// Brings closed months in line with the daily reports.
    async fn reconcile(&mut self, now: DateTime<Utc>) {
        let changed = self.state.cascade_monthly(now);
        if !changed.is_empty() {
            debug!(months = ?changed, "monthly reports cascaded");
            self.persist(StoreKey::MonthlyReports).await;
        }
    }

    fn cancel_pending(&self, key: StoreKey) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.cancel(key);
        }
    }

    /// Writes a key locally and schedules its remote push.
    async fn persist(&self, key: StoreKey) {
        let Some(value) = self.store_locally(key).await else {
            return;
        };
        if key.is_session_scoped() {
            return;
        }
        if let Some(debouncer) = &self.debouncer {
            debouncer.schedule(key, value);
        }
    }

    async fn store_locally(&self, key: StoreKey) -> Option<serde_json::Value> {
        let value = match self.state.value_for(key) {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!(%key, error = %e, "cannot encode state");
                return None;
            }
        };
        if let Err(e) = self.store.set(key, &value).await {
            warn!(%key, error = %e, "local write failed");
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use super::*;
    use crate::auth::hash_password;
    use crate::books::DebtorInput;
    use crate::storage::StorageService;

    #[derive(Default)]
    struct FakeRemote {
        rows: Vec<RemoteChange>,
        writes: Mutex<Vec<(StoreKey, Value)>>,
    }

    impl FakeRemote {
        fn written_keys(&self) -> Vec<StoreKey> {
            self.writes.lock().unwrap().iter().map(|(k, _)| *k).collect()
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn upsert(&self, key: StoreKey, value: &Value) -> Result<(), SyncError> {
            self.writes.lock().unwrap().push((key, value.clone()));
            Ok(())
        }

        async fn fetch_all(&self) -> Result<Vec<RemoteChange>, SyncError> {
            Ok(self.rows.clone())
        }
    }

    fn settings() -> SyncSettings {
        SyncSettings {
            debounce_ms: 1500,
            channel_capacity: 8,
        }
    }

    async fn engine(remote: Arc<FakeRemote>) -> (SyncEngine, Arc<StorageService>) {
        let store = Arc::new(StorageService::in_memory().unwrap());
        let engine = SyncEngine::start(
            store.clone(),
            Some(remote as Arc<dyn RemoteStore>),
            &settings(),
            chrono_tz::Africa::Cairo,
        )
        .await;
        (engine, store)
    }

    async fn login_admin(engine: &mut SyncEngine) {
        let today = engine.today();
        engine
            .execute(&[StoreKey::CurrentEntry], |state, session| {
                state.login(session, "admin", "2026", today).map(|_| ())
            })
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_writes_locally_then_remotely() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, store) = engine(remote.clone()).await;
        login_admin(&mut engine).await;

        engine
            .execute(&[StoreKey::Debtors], |state, session| {
                state
                    .add_debtor(
                        session,
                        DebtorInput {
                            name: "Ali".to_string(),
                            balance: dec!(40),
                        },
                    )
                    .map(|_| ())
            })
            .await
            .unwrap();

        let local = store.get(StoreKey::Debtors).await.unwrap().unwrap();
        assert_eq!(local[0]["name"], "Ali");
        assert!(remote.written_keys().is_empty());
        assert!(!engine.is_idle());

        tokio::time::sleep(Duration::from_secs(2)).await;
        let keys = remote.written_keys();
        assert!(keys.contains(&StoreKey::Debtors));
        assert!(keys.contains(&StoreKey::CurrentEntry));
        assert!(engine.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_operation_writes_nothing() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, store) = engine(remote.clone()).await;

        let result = engine
            .execute(&[StoreKey::Records], |state, session| {
                state.finish_shift(session, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get(StoreKey::Records).await.unwrap(), None);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(remote.written_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_daily_change_cascades() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, store) = engine(remote.clone()).await;

        let june = FiscalMonth::new(2025, 6).unwrap();
        let monthly = json!([{
            "month": "2025-06",
            "sales": 300,
            "expenses": 0,
            "net": 300,
            "daysCount": 1,
            "finalizedBy": "admin"
        }]);
        engine
            .handle_remote(RemoteChange::new(StoreKey::MonthlyReports, Some(monthly)))
            .await;

        let daily = json!([
            { "date": "2025-06-10", "sales": 300, "expenses": 0, "net": 300, "shiftCount": 1 },
            { "date": "2025-07-02", "sales": 200, "expenses": 50, "net": 150, "shiftCount": 1 }
        ]);
        let outcome = engine
            .handle_remote(RemoteChange::new(StoreKey::DailyReports, Some(daily)))
            .await;
        assert_eq!(outcome, MergeOutcome::Applied(StoreKey::DailyReports));

        let report = &engine.state().monthly[0];
        assert_eq!(report.month, june);
        assert_eq!(report.sales, dec!(500));
        assert_eq!(report.net, dec!(450));
        assert_eq!(report.days_count, 2);
        assert!(report.updated_at.is_some());

        let local = store.get(StoreKey::MonthlyReports).await.unwrap().unwrap();
        assert_eq!(local[0]["daysCount"], 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(remote.written_keys(), vec![StoreKey::MonthlyReports]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_remote_value_writes_nothing() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote.clone()).await;

        let outcome = engine
            .handle_remote(RemoteChange::new(StoreKey::Orders, Some(json!([]))))
            .await;
        assert_eq!(outcome, MergeOutcome::Unchanged(StoreKey::Orders));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(remote.written_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_finalize_day_pushes_reports() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, store) = engine(remote.clone()).await;
        let today = engine.today();

        let mut session_entry = crate::ledger::ShiftEntry::for_worker(
            today,
            "medhat",
            crate::ledger::ShiftKind::Morning,
        );
        session_entry.sales = dec!(450);
        engine
            .execute(&[StoreKey::Records], |state, _| {
                state.entries.push(session_entry);
                Ok(())
            })
            .await
            .unwrap();
        login_admin(&mut engine).await;

        let now = Utc::now();
        let outcome = engine.finalize_day(now).await.unwrap();
        assert_eq!(outcome.report.sales, dec!(450));
        assert!(outcome.replaced.is_none());

        let local = store.get(StoreKey::DailyReports).await.unwrap().unwrap();
        assert_eq!(local.as_array().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let keys = remote.written_keys();
        assert!(keys.contains(&StoreKey::DailyReports));
        assert!(keys.contains(&StoreKey::Records));
        assert!(!keys.contains(&StoreKey::MonthlyReports));
    }

    #[tokio::test]
    async fn test_pull_skips_kill_switch() {
        let remote = Arc::new(FakeRemote {
            rows: vec![
                RemoteChange::new(StoreKey::KillSwitch, Some(json!("1"))),
                RemoteChange::new(StoreKey::Debtors, Some(json!([
                    { "id": 1, "name": "Ali", "balance": 10, "history": [] }
                ]))),
                RemoteChange::new(StoreKey::ActiveTab, Some(json!("orders"))),
            ],
            ..FakeRemote::default()
        });
        let (mut engine, store) = engine(remote.clone()).await;
        let mut users = engine.state().users.clone();
        users[1].password = hash_password("1234");
        let today = engine.today();
        engine
            .execute(&[], |state, session| {
                state.users = users;
                state.login(session, "medhat", "1234", today).map(|_| ())
            })
            .await
            .unwrap();

        assert_eq!(engine.pull(remote.as_ref()).await.unwrap(), 1);
        assert!(engine.session().is_logged_in());
        assert_eq!(engine.state().debtors[0].name, "Ali");
        assert!(store.get(StoreKey::Debtors).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_kill_switch_over_feed() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote).await;
        login_admin(&mut engine).await;

        let (tx, rx) = mpsc::channel(4);
        tx.send(RemoteChange::new(StoreKey::KillSwitch, Some(json!("42"))))
            .await
            .unwrap();
        drop(tx);

        let result = engine.run(rx, CancellationToken::new()).await;
        assert!(matches!(result, Err(SyncError::FeedClosed)));
        assert!(!engine.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote).await;
        let (_tx, rx) = mpsc::channel::<RemoteChange>(4);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(engine.run(rx, cancel).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_reset_leaves_no_stale_month_behind() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, store) = engine(remote.clone()).await;

        let monthly = json!([{
            "month": "2025-06",
            "sales": 300,
            "expenses": 0,
            "net": 300,
            "daysCount": 1,
            "finalizedBy": "admin"
        }]);
        let daily = json!([
            { "date": "2025-06-10", "sales": 300, "expenses": 0, "net": 300, "shiftCount": 1 }
        ]);
        engine
            .handle_remote(RemoteChange::new(StoreKey::MonthlyReports, Some(monthly)))
            .await;
        engine
            .handle_remote(RemoteChange::new(StoreKey::DailyReports, Some(daily)))
            .await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(remote.written_keys().is_empty());

        // Data reset order: daily reports are cleared before monthly reports.
        engine
            .handle_remote(RemoteChange::new(StoreKey::DailyReports, Some(json!([]))))
            .await;
        engine
            .handle_remote(RemoteChange::new(StoreKey::MonthlyReports, Some(json!([]))))
            .await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(engine.state().monthly.is_empty());
        assert_eq!(
            store.get(StoreKey::MonthlyReports).await.unwrap(),
            Some(json!([]))
        );
        assert!(remote.written_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_value_supersedes_pending_local_write() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote.clone()).await;
        login_admin(&mut engine).await;

        engine
            .execute(&[StoreKey::Debtors], |state, session| {
                state
                    .add_debtor(
                        session,
                        DebtorInput {
                            name: "Ali".to_string(),
                            balance: dec!(40),
                        },
                    )
                    .map(|_| ())
            })
            .await
            .unwrap();

        let newer = json!([{ "id": 7, "name": "Omar", "balance": 5, "history": [] }]);
        let outcome = engine
            .handle_remote(RemoteChange::new(StoreKey::Debtors, Some(newer)))
            .await;
        assert_eq!(outcome, MergeOutcome::Applied(StoreKey::Debtors));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!remote.written_keys().contains(&StoreKey::Debtors));
        assert_eq!(engine.state().debtors[0].name, "Omar");
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_logged_out() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote).await;
        login_admin(&mut engine).await;
        assert!(engine.session().is_logged_in());

        let (_tx, rx) = mpsc::channel::<RemoteChange>(4);
        let ran = tokio::time::timeout(
            Duration::from_secs(31 * 60),
            engine.run(rx, CancellationToken::new()),
        )
        .await;

        assert!(ran.is_err());
        assert!(!engine.session().is_logged_in());
        assert!(engine.state().current_entry.user.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_alive() {
        let remote = Arc::new(FakeRemote::default());
        let (mut engine, _store) = engine(remote).await;
        login_admin(&mut engine).await;

        for _ in 0..3 {
            let (_tx, rx) = mpsc::channel::<RemoteChange>(4);
            let ran = tokio::time::timeout(
                Duration::from_secs(20 * 60),
                engine.run(rx, CancellationToken::new()),
            )
            .await;
            assert!(ran.is_err());
            engine.execute(&[], |_, _| Ok(())).await.unwrap();
        }

        assert!(engine.session().is_logged_in());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_is_configurable() {
        let remote = Arc::new(FakeRemote::default());
        let (engine, _store) = engine(remote).await;
        let mut engine = engine.with_idle_timeout(Duration::from_secs(60));
        login_admin(&mut engine).await;

        let (_tx, rx) = mpsc::channel::<RemoteChange>(4);
        let ran = tokio::time::timeout(
            Duration::from_secs(90),
            engine.run(rx, CancellationToken::new()),
        )
        .await;

        assert!(ran.is_err());
        assert!(!engine.session().is_logged_in());
    }

    #[test]
    fn test_local_time_in_store_timezone() {
        let cairo = chrono_tz::Africa::Cairo;
        let late = Utc.with_ymd_and_hms(2025, 6, 10, 22, 30, 0).unwrap();
        assert_eq!(
            late.with_timezone(&cairo).date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()
        );
    }
}
