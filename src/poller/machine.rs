//! Admin status state machine.
//!
//! [`StatusMachine`] is pure: it decides whether a trigger starts a network
//! check and folds check results into a [`PollerState`]. Timing and I/O
//! live in [`super::StatusPoller`].
//!
//! A single pending ticket gates every trigger. Results carrying any other
//! ticket are discarded.

use chrono::{DateTime, Duration, Utc};

use crate::domain::CacheEntry;

/// Lifecycle state of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Waiting for the identity provider, or nothing checked yet.
    Idle,
    /// A network check is in flight.
    Checking,
    /// Last verdict: administrator.
    Authorized,
    /// Last verdict: not an administrator, or the check failed.
    Denied,
}

/// What asked for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    /// Initial mount of the protected surface.
    Mount,
    /// The user pressed retry on the denial notice.
    ManualRetry,
    /// The surface became visible again.
    VisibilityVisible,
    /// Periodic timer fired.
    Timer,
}

impl PollTrigger {
    /// Forced triggers bypass the cached verdict and are rate limited.
    #[must_use]
    pub const fn is_forced(self) -> bool {
        !matches!(self, Self::Mount)
    }
}

/// Handle for one started check. Only the most recent ticket is accepted by
/// [`StatusMachine::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTicket {
    generation: u64,
    forced: bool,
}

impl CheckTicket {
    /// Whether the check should bypass server-side caching too.
    #[must_use]
    pub const fn forced(self) -> bool {
        self.forced
    }
}

/// Why a trigger did not start a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The identity provider has not loaded a session yet.
    SessionNotLoaded,
    /// Another check is still pending.
    InFlight,
    /// The previous forced check was too recent.
    Throttled,
    /// The cached verdict is still inside its TTL.
    CacheFresh,
    /// The poller already navigated home.
    Finished,
}

/// Result of [`StatusMachine::on_trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckDecision {
    /// Run a network check and report back with this ticket.
    Start(CheckTicket),
    /// A fresh cached verdict was applied without a network call.
    UseCached(CheckOutcome),
    /// Nothing to do.
    Skip(SkipReason),
}

/// Effect of applying a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Now in [`PollerState::Authorized`].
    Authorized,
    /// Now in [`PollerState::Denied`].
    Denied,
    /// Admin confirmed while the denial notice was shown; leave for the
    /// home surface. Terminal.
    NavigateHome,
    /// The result belonged to a superseded check and was ignored.
    Discarded,
}

/// Poller state machine.
#[derive(Debug, Clone)]
pub struct StatusMachine {
    client_ttl: Duration,
    min_forced_spacing: Duration,
    state: PollerState,
    session_loaded: bool,
    generation: u64,
    pending: Option<u64>,
    last_forced_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    denial_shown: bool,
    navigated: bool,
}

impl StatusMachine {
    /// Creates an idle machine.
    #[must_use]
    pub const fn new(client_ttl: Duration, min_forced_spacing: Duration) -> Self {
        Self {
            client_ttl,
            min_forced_spacing,
            state: PollerState::Idle,
            session_loaded: false,
            generation: 0,
            pending: None,
            last_forced_at: None,
            last_error: None,
            denial_shown: false,
            navigated: false,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PollerState {
        self.state
    }

    /// Message of the most recent failed check, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `true` once the terminal navigation has happened.
    #[must_use]
    pub const fn has_navigated(&self) -> bool {
        self.navigated
    }

    /// `true` while a check is pending.
    #[must_use]
    pub const fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    /// Marks the identity session as loaded; triggers are accepted from now on.
    pub fn session_loaded(&mut self) {
        self.session_loaded = true;
    }

    /// Forgets the current session. Any pending check becomes stale.
    pub fn reset(&mut self) {
        self.state = PollerState::Idle;
        self.session_loaded = false;
        self.pending = None;
        self.last_error = None;
        self.denial_shown = false;
    }

    /// Decides what to do with `trigger` given the persisted verdict.
    pub fn on_trigger(
        &mut self,
        trigger: PollTrigger,
        cached: Option<&CacheEntry<bool>>,
        now: DateTime<Utc>,
    ) -> CheckDecision {
        if self.navigated {
            return CheckDecision::Skip(SkipReason::Finished);
        }
        if !self.session_loaded {
            return CheckDecision::Skip(SkipReason::SessionNotLoaded);
        }
        if self.pending.is_some() {
            return CheckDecision::Skip(SkipReason::InFlight);
        }

        let fresh = cached.filter(|entry| entry.is_fresh(self.client_ttl, now));
        match trigger {
            PollTrigger::Mount => match fresh {
                Some(entry) => CheckDecision::UseCached(self.apply(Ok(entry.value))),
                None => CheckDecision::Start(self.start(false)),
            },
            PollTrigger::VisibilityVisible if fresh.is_some() => {
                CheckDecision::Skip(SkipReason::CacheFresh)
            }
            PollTrigger::VisibilityVisible | PollTrigger::ManualRetry | PollTrigger::Timer => {
                if let Some(last) = self.last_forced_at
                    && now.signed_duration_since(last) < self.min_forced_spacing
                {
                    return CheckDecision::Skip(SkipReason::Throttled);
                }
                self.last_forced_at = Some(now);
                CheckDecision::Start(self.start(true))
            }
        }
    }

    /// Folds the result of the check identified by `ticket` into the state.
    pub fn complete(&mut self, ticket: CheckTicket, result: Result<bool, String>) -> CheckOutcome {
        if self.navigated || self.pending != Some(ticket.generation) {
            return CheckOutcome::Discarded;
        }
        self.pending = None;
        self.apply(result)
    }

    fn start(&mut self, forced: bool) -> CheckTicket {
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(self.generation);
        self.state = PollerState::Checking;
        CheckTicket {
            generation: self.generation,
            forced,
        }
    }

    fn apply(&mut self, result: Result<bool, String>) -> CheckOutcome {
        match result {
            Ok(true) if self.denial_shown => {
                self.state = PollerState::Authorized;
                self.last_error = None;
                self.navigated = true;
                CheckOutcome::NavigateHome
            }
            Ok(true) => {
                self.state = PollerState::Authorized;
                self.last_error = None;
                CheckOutcome::Authorized
            }
            Ok(false) => self.deny(),
            Err(message) => {
                self.last_error = Some(message);
                self.deny()
            }
        }
    }

    fn deny(&mut self) -> CheckOutcome {
        self.state = PollerState::Denied;
        self.denial_shown = true;
        CheckOutcome::Denied
    }
}
