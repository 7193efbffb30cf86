//! Async driver for the admin status state machine.
//!
//! [`StatusPoller::run`] owns a [`StatusMachine`] and reacts to three
//! sources: caller inputs (session changes and triggers), the periodic
//! timer, and completed checks. Checks run on spawned tasks so that
//! triggers arriving meanwhile are seen, and rejected, by the machine.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::cache::PersistedVerdictCache;
use super::config::PollerConfig;
use super::machine::{
    CheckDecision, CheckOutcome, CheckTicket, PollTrigger, PollerState, StatusMachine,
};
use crate::api::dto::AdminStatusResponse;

/// Errors raised while checking admin status.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    /// Transport, timeout or body decoding failure.
    #[error("status request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("status endpoint returned {0}")]
    Status(u16),
}

/// Performs one admin status check for a user.
#[async_trait]
pub trait AdminStatusChecker: Send + Sync + fmt::Debug {
    /// Asks the gateway whether `user` is an administrator. `force` asks
    /// the gateway to bypass its own role cache.
    ///
    /// # Errors
    ///
    /// Returns a [`PollerError`] when the request fails or the gateway
    /// does not answer with a status body.
    async fn check(&self, user: &str, force: bool) -> Result<AdminStatusResponse, PollerError>;
}

/// [`AdminStatusChecker`] calling `GET /api/v1/admin/status` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusChecker {
    client: reqwest::Client,
    status_url: String,
    identity_header: String,
}

impl HttpStatusChecker {
    /// Builds a checker with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &PollerConfig) -> Result<Self, PollerError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            status_url: config.status_url(),
            identity_header: config.identity_header.clone(),
        })
    }
}

#[async_trait]
impl AdminStatusChecker for HttpStatusChecker {
    async fn check(&self, user: &str, force: bool) -> Result<AdminStatusResponse, PollerError> {
        let url = format!("{}?refresh={force}", self.status_url);
        let response = self
            .client
            .get(url)
            .header(self.identity_header.as_str(), user)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollerError::Status(status.as_u16()));
        }
        Ok(response.json::<AdminStatusResponse>().await?)
    }
}

/// Events fed into a running [`StatusPoller`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerInput {
    /// The identity provider has a session for `user_id`. Implies a mount.
    SessionLoaded {
        /// Signed-in user.
        user_id: String,
    },
    /// The session ended; pending results are dropped.
    SignedOut,
    /// An external trigger.
    Trigger(PollTrigger),
}

/// Observable poller status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerSnapshot {
    /// Current machine state.
    pub state: PollerState,
    /// Message of the last failed check.
    pub last_error: Option<String>,
    /// Set once the poller has sent the user home.
    pub navigated_home: bool,
}

impl Default for PollerSnapshot {
    fn default() -> Self {
        Self {
            state: PollerState::Idle,
            last_error: None,
            navigated_home: false,
        }
    }
}

#[derive(Debug)]
struct CheckDone {
    ticket: CheckTicket,
    user: String,
    result: Result<bool, String>,
}

/// Event loop around [`StatusMachine`].
#[derive(Debug)]
pub struct StatusPoller {
    config: PollerConfig,
    machine: StatusMachine,
    cache: PersistedVerdictCache,
    checker: Arc<dyn AdminStatusChecker>,
    user: Option<String>,
    snapshot: watch::Sender<PollerSnapshot>,
}

impl StatusPoller {
    /// Creates a poller. The cache should use `config.client_ttl`.
    #[must_use]
    pub fn new(
        config: PollerConfig,
        cache: PersistedVerdictCache,
        checker: Arc<dyn AdminStatusChecker>,
    ) -> Self {
        let machine = StatusMachine::new(config.client_ttl, config.min_forced_spacing);
        let (snapshot, _) = watch::channel(PollerSnapshot::default());
        Self {
            config,
            machine,
            cache,
            checker,
            user: None,
            snapshot,
        }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.snapshot.subscribe()
    }

    /// Runs until the input channel closes or the poller navigates home,
    /// returning the final snapshot.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<PollerInput>) -> PollerSnapshot {
        let period = self.config.poll_interval;
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let (done_tx, mut done_rx) = mpsc::channel::<CheckDone>(8);

        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle_input(input, &done_tx).await,
                    None => break,
                },
                _ = timer.tick() => self.trigger(PollTrigger::Timer, &done_tx).await,
                Some(done) = done_rx.recv() => self.finish(done).await,
            }
            self.publish();
            if self.machine.has_navigated() {
                break;
            }
        }

        self.snapshot.borrow().clone()
    }

    async fn handle_input(&mut self, input: PollerInput, done_tx: &mpsc::Sender<CheckDone>) {
        match input {
            PollerInput::SessionLoaded { user_id } => {
                if self.user.as_deref() != Some(user_id.as_str()) {
                    self.machine.reset();
                }
                tracing::debug!(user = %user_id, "poller session loaded");
                self.user = Some(user_id);
                self.machine.session_loaded();
                self.trigger(PollTrigger::Mount, done_tx).await;
            }
            PollerInput::SignedOut => {
                self.user = None;
                self.machine.reset();
            }
            PollerInput::Trigger(trigger) => self.trigger(trigger, done_tx).await,
        }
    }

    async fn trigger(&mut self, trigger: PollTrigger, done_tx: &mpsc::Sender<CheckDone>) {
        let cached = match &self.user {
            Some(user) => self.cache.load(user).await,
            None => None,
        };
        match self.machine.on_trigger(trigger, cached.as_ref(), Utc::now()) {
            CheckDecision::Start(ticket) => {
                let Some(user) = self.user.clone() else {
                    return;
                };
                tracing::debug!(user = %user, ?trigger, forced = ticket.forced(), "checking admin status");
                let checker = Arc::clone(&self.checker);
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let result = checker
                        .check(&user, ticket.forced())
                        .await
                        .map(|status| status.is_admin)
                        .map_err(|e| e.to_string());
                    let _ = done_tx.send(CheckDone { ticket, user, result }).await;
                });
            }
            CheckDecision::UseCached(outcome) => {
                tracing::debug!(?trigger, ?outcome, "using cached admin verdict");
            }
            CheckDecision::Skip(reason) => {
                tracing::debug!(?trigger, ?reason, "status check skipped");
            }
        }
    }

    async fn finish(&mut self, done: CheckDone) {
        let CheckDone {
            ticket,
            user,
            result,
        } = done;
        let verdict = result.as_ref().ok().copied();
        if let Err(e) = &result {
            tracing::warn!(user = %user, error = %e, "admin status check failed");
        }
        let outcome = self.machine.complete(ticket, result);
        if outcome == CheckOutcome::Discarded {
            tracing::debug!(user = %user, "discarding stale status result");
            return;
        }
        if let Some(is_admin) = verdict {
            self.cache.store(&user, is_admin, Utc::now()).await;
        }
        if outcome == CheckOutcome::NavigateHome {
            tracing::info!(user = %user, "admin access granted, navigating home");
        }
    }

    fn publish(&self) {
        let next = PollerSnapshot {
            state: self.machine.state(),
            last_error: self.machine.last_error().map(str::to_string),
            navigated_home: self.machine.has_navigated(),
        };
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    use chrono::Duration;

    use super::*;
    use crate::poller::cache::{MemoryVerdictStorage, VerdictStorage};

    #[derive(Debug, Default)]
    struct ScriptedChecker {
        replies: Mutex<VecDeque<Result<bool, u16>>>,
        calls: AtomicUsize,
    }

    impl ScriptedChecker {
        fn new(replies: impl IntoIterator<Item = Result<bool, u16>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AdminStatusChecker for ScriptedChecker {
        async fn check(&self, _user: &str, _force: bool) -> Result<AdminStatusResponse, PollerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or(Err(500));
            match reply {
                Ok(is_admin) => Ok(AdminStatusResponse {
                    is_admin,
                    user_details: None,
                }),
                Err(code) => Err(PollerError::Status(code)),
            }
        }
    }

    struct Harness {
        inputs: mpsc::Sender<PollerInput>,
        snapshots: watch::Receiver<PollerSnapshot>,
        handle: tokio::task::JoinHandle<PollerSnapshot>,
        checker: Arc<ScriptedChecker>,
        storage: Arc<MemoryVerdictStorage>,
    }

    fn spawn(checker: ScriptedChecker, storage: Arc<MemoryVerdictStorage>) -> Harness {
        let config = PollerConfig::new("http://127.0.0.1:1");
        let cache = PersistedVerdictCache::new(
            Arc::clone(&storage) as Arc<dyn VerdictStorage>,
            config.client_ttl,
        );
        let checker = Arc::new(checker);
        let poller = StatusPoller::new(
            config,
            cache,
            Arc::clone(&checker) as Arc<dyn AdminStatusChecker>,
        );
        let snapshots = poller.subscribe();
        let (inputs, rx) = mpsc::channel(8);
        let handle = tokio::spawn(poller.run(rx));
        Harness {
            inputs,
            snapshots,
            handle,
            checker,
            storage,
        }
    }

    async fn wait_for_state(rx: &mut watch::Receiver<PollerSnapshot>, state: PollerState) {
        let waited = tokio::time::timeout(
            StdDuration::from_secs(5),
            rx.wait_for(|s| s.state == state),
        )
        .await;
        assert!(matches!(waited, Ok(Ok(_))), "never reached {state:?}");
    }

    async fn send(harness: &Harness, input: PollerInput) {
        assert!(harness.inputs.send(input).await.is_ok());
    }

    #[tokio::test]
    async fn retry_after_denial_navigates_home() {
        let mut h = spawn(
            ScriptedChecker::new([Ok(false), Ok(true)]),
            Arc::new(MemoryVerdictStorage::new()),
        );
        send(&h, PollerInput::SessionLoaded { user_id: "u1".to_string() }).await;
        wait_for_state(&mut h.snapshots, PollerState::Denied).await;

        send(&h, PollerInput::Trigger(PollTrigger::ManualRetry)).await;
        let Ok(Ok(last)) = tokio::time::timeout(StdDuration::from_secs(5), h.handle).await else {
            panic!("poller did not finish");
        };
        assert!(last.navigated_home);
        assert_eq!(last.state, PollerState::Authorized);
        assert_eq!(h.checker.calls(), 2);
        assert!(h.storage.get("admin_status:u1").await.is_some());
    }

    #[tokio::test]
    async fn fresh_persisted_verdict_skips_network() {
        let storage = Arc::new(MemoryVerdictStorage::new());
        let cache = PersistedVerdictCache::new(
            Arc::clone(&storage) as Arc<dyn VerdictStorage>,
            Duration::minutes(30),
        );
        cache.store("u1", true, Utc::now()).await;

        let mut h = spawn(ScriptedChecker::new([]), storage);
        send(&h, PollerInput::SessionLoaded { user_id: "u1".to_string() }).await;
        wait_for_state(&mut h.snapshots, PollerState::Authorized).await;

        drop(h.inputs);
        let Ok(Ok(last)) = tokio::time::timeout(StdDuration::from_secs(5), h.handle).await else {
            panic!("poller did not stop");
        };
        assert!(!last.navigated_home);
        assert_eq!(h.checker.calls(), 0);
    }

    #[tokio::test]
    async fn failed_check_denies_with_error() {
        let mut h = spawn(
            ScriptedChecker::new([Err(503)]),
            Arc::new(MemoryVerdictStorage::new()),
        );
        send(&h, PollerInput::SessionLoaded { user_id: "u1".to_string() }).await;
        wait_for_state(&mut h.snapshots, PollerState::Denied).await;
        let error = h.snapshots.borrow().last_error.clone();
        assert_eq!(error.as_deref(), Some("status endpoint returned 503"));
        assert!(h.storage.get("admin_status:u1").await.is_none());

        drop(h.inputs);
        assert!(tokio::time::timeout(StdDuration::from_secs(5), h.handle).await.is_ok());
    }

    #[tokio::test]
    async fn triggers_before_session_are_ignored() {
        let h = spawn(ScriptedChecker::new([]), Arc::new(MemoryVerdictStorage::new()));
        send(&h, PollerInput::Trigger(PollTrigger::ManualRetry)).await;
        drop(h.inputs);
        let Ok(Ok(last)) = tokio::time::timeout(StdDuration::from_secs(5), h.handle).await else {
            panic!("poller did not stop");
        };
        assert_eq!(last.state, PollerState::Idle);
        assert_eq!(h.checker.calls(), 0);
    }
}
