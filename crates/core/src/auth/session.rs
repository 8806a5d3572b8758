//! Local session state and the idle watchdog.
//!
//! Session fields never leave the machine: they are not persisted to the
//! shared store and remote updates to them are ignored.

use std::sync::Arc;
use std::time::Duration;

use shiftbook_shared::types::SessionId;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::SystemUser;

/// Tab shown after login and after every logout.
pub const DEFAULT_TAB: &str = "logger";

/// Who is logged in on this machine, and what they are looking at.
#[derive(Debug, Clone)]
pub struct SessionState {
    id: SessionId,
    user: Option<SystemUser>,
    active_tab: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A logged-out session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            user: None,
            active_tab: DEFAULT_TAB.to_string(),
        }
    }

    /// Session identity, regenerated on every login.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The logged-in user.
    #[must_use]
    pub const fn user(&self) -> Option<&SystemUser> {
        self.user.as_ref()
    }

    /// Returns true while a user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Currently selected tab.
    #[must_use]
    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    /// Selects a tab.
    pub fn set_active_tab(&mut self, tab: impl Into<String>) {
        self.active_tab = tab.into();
    }

    /// Starts a session for the user.
    pub fn begin(&mut self, user: SystemUser) {
        self.id = SessionId::new();
        info!(session = %self.id, username = %user.username, "session started");
        self.user = Some(user);
    }

    /// Ends the session and returns to the default tab.
    pub fn end(&mut self) {
        if let Some(user) = self.user.take() {
            info!(session = %self.id, username = %user.username, "session ended");
        }
        self.active_tab = DEFAULT_TAB.to_string();
    }

    /// Ends the session on a remote security signal.
    ///
    /// Returns true if a user was logged in.
    pub fn invalidate(&mut self) -> bool {
        let was_logged_in = self.is_logged_in();
        if was_logged_in {
            warn!(session = %self.id, "session invalidated by kill switch");
        }
        self.end();
        self.id = SessionId::new();
        was_logged_in
    }
}

/// Fires a callback once no activity has been seen for the timeout.
///
/// Each [`touch`](Self::touch) restarts the countdown. The watchdog stops
/// after firing, or when its token is cancelled.
pub struct IdleWatchdog {
    activity: Arc<Notify>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl IdleWatchdog {
    /// Spawns the watchdog on the current tokio runtime.
    pub fn spawn<F>(timeout: Duration, cancel: CancellationToken, on_idle: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let activity = Arc::new(Notify::new());
        let task_activity = Arc::clone(&activity);
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => {
                        debug!("idle watchdog cancelled");
                        return;
                    }
                    () = task_activity.notified() => {}
                    () = tokio::time::sleep(timeout) => {
                        info!(timeout_secs = timeout.as_secs(), "session idle, logging out");
                        on_idle();
                        return;
                    }
                }
            }
        });

        Self {
            activity,
            cancel,
            handle,
        }
    }

    /// Records user activity.
    pub fn touch(&self) {
        self.activity.notify_one();
    }

    /// Returns true once the watchdog has fired or been stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the watchdog without firing.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for IdleWatchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
