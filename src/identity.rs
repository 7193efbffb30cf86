//! Caller identity resolution.
//!
//! The identity provider is an opaque oracle: given an inbound request it
//! returns the caller's user identifier, if any. The default
//! [`HeaderIdentity`] trusts a header set by the upstream authentication
//! proxy.

use std::convert::Infallible;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::HeaderName;
use axum::http::request::Parts;

use crate::app_state::AppState;

/// Resolves the caller's user identifier from a request.
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Returns the caller identifier, or `None` for anonymous requests.
    fn current_user_identifier(&self, parts: &Parts) -> Option<String>;
}

/// Reads the caller identifier from a trusted request header.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    /// Default header name.
    pub const DEFAULT_HEADER: &'static str = "x-user-id";

    /// Creates a provider reading `header`. Falls back to
    /// [`HeaderIdentity::DEFAULT_HEADER`] if the name is not a valid header.
    #[must_use]
    pub fn new(header: &str) -> Self {
        let header = HeaderName::try_from(header.to_ascii_lowercase()).unwrap_or_else(|_| {
            tracing::warn!(header, "invalid identity header name, using default");
            HeaderName::from_static(Self::DEFAULT_HEADER)
        });
        Self { header }
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(Self::DEFAULT_HEADER),
        }
    }
}

impl IdentityProvider for HeaderIdentity {
    fn current_user_identifier(&self, parts: &Parts) -> Option<String> {
        parts
            .headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Extractor yielding the caller identity resolved by the configured
/// [`IdentityProvider`]. Never rejects; anonymous callers get `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Option<String>);

impl CallerIdentity {
    /// Borrows the identifier, if any.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(state.identity.current_user_identifier(parts)))
    }
}
