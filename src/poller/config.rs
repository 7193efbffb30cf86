//! Poller timing configuration.

use std::time::Duration as StdDuration;

use chrono::Duration;

/// Client-side verdict TTL: thirty minutes.
pub const DEFAULT_CLIENT_TTL_SECS: i64 = 30 * 60;

/// Periodic re-check interval: thirty minutes.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30 * 60;

/// Minimum spacing between forced network checks.
pub const DEFAULT_MIN_FORCED_SPACING_SECS: i64 = 60;

/// Settings for [`super::StatusPoller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Gateway base URL, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Header carrying the caller identity.
    pub identity_header: String,
    /// How long a persisted verdict stays usable.
    pub client_ttl: Duration,
    /// Period of the background re-check timer.
    pub poll_interval: StdDuration,
    /// Minimum time between two forced checks.
    pub min_forced_spacing: Duration,
    /// Per-request timeout of the status call.
    pub request_timeout: StdDuration,
}

impl PollerConfig {
    /// Creates a config for `base_url` with the default timings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            identity_header: crate::identity::HeaderIdentity::DEFAULT_HEADER.to_string(),
            client_ttl: Duration::seconds(DEFAULT_CLIENT_TTL_SECS),
            poll_interval: StdDuration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            min_forced_spacing: Duration::seconds(DEFAULT_MIN_FORCED_SPACING_SECS),
            request_timeout: StdDuration::from_secs(10),
        }
    }

    /// URL of the admin status endpoint.
    #[must_use]
    pub fn status_url(&self) -> String {
        format!(
            "{}/api/v1/admin/status",
            self.base_url.trim_end_matches('/')
        )
    }
}
