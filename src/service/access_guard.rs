//! Route protection on top of the [`RoleCache`].
//!
//! Handlers ask the [`AccessGuard`] for a [`Verdict`] before running any
//! privileged work. Store failures fail closed: they produce
//! [`Verdict::Forbidden`], never [`Verdict::Authorized`].

use std::sync::Arc;

use serde::Serialize;

use super::RoleCache;
use crate::error::GatewayError;

/// Reason attached to a denial when the caller is simply not an admin.
pub const REASON_NOT_ADMIN: &str = "not an administrator";

/// Reason attached to a denial when the role could not be determined.
pub const REASON_LOOKUP_FAILED: &str = "role lookup failed";

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    /// No caller identity was available.
    Unauthenticated,
    /// Caller identified but not allowed.
    Forbidden(String),
    /// Caller allowed.
    Authorized,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Authorized`].
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Converts a denial into the matching [`GatewayError`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthenticated`] or
    /// [`GatewayError::Forbidden`] for the respective verdicts.
    pub fn into_result(self) -> Result<(), GatewayError> {
        match self {
            Self::Authorized => Ok(()),
            Self::Unauthenticated => Err(GatewayError::Unauthenticated),
            Self::Forbidden(reason) => Err(GatewayError::Forbidden(reason)),
        }
    }
}

/// Admin gate used by handlers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    roles: Arc<RoleCache>,
}

impl AccessGuard {
    /// Creates a guard over an injected role cache.
    #[must_use]
    pub fn new(roles: Arc<RoleCache>) -> Self {
        Self { roles }
    }

    /// Returns the underlying role cache.
    #[must_use]
    pub fn roles(&self) -> &Arc<RoleCache> {
        &self.roles
    }

    /// Decides whether `user` may perform an admin-only operation.
    pub async fn authorize(&self, user: Option<&str>) -> Verdict {
        let Some(user) = user else {
            return Verdict::Unauthenticated;
        };
        match self.roles.lookup(user, false).await {
            Ok(true) => Verdict::Authorized,
            Ok(false) => {
                tracing::info!(user, "admin access denied");
                Verdict::Forbidden(REASON_NOT_ADMIN.to_string())
            }
            Err(e) => {
                tracing::warn!(user, error = %e, "role lookup failed, denying");
                Verdict::Forbidden(REASON_LOOKUP_FAILED.to_string())
            }
        }
    }

    /// Like [`AccessGuard::authorize`], but a caller acting on their own
    /// resource is allowed without an admin lookup.
    pub async fn authorize_for(&self, owner: &str, requesting: Option<&str>) -> Verdict {
        match requesting {
            Some(user) if user == owner => Verdict::Authorized,
            other => self.authorize(other).await,
        }
    }

    /// Requires an authorized admin and returns their identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthenticated`] or
    /// [`GatewayError::Forbidden`] when access is denied.
    pub async fn require_admin(&self, user: Option<&str>) -> Result<String, GatewayError> {
        let Some(user) = user else {
            return Err(GatewayError::Unauthenticated);
        };
        self.authorize(Some(user)).await.into_result()?;
        Ok(user.to_string())
    }
}
