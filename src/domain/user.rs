//! User records as seen by the authorization layer.
//!
//! Users are owned by the external user store; this crate only reads them
//! to decide whether an identifier carries the administrator role.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role attached to a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Marketplace operator with access to the admin dashboard.
    Admin,
    /// Regular buyer or seller.
    Customer,
}

impl UserRole {
    /// Returns the role as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Customer => "customer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A user record from the external user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Opaque identifier issued by the identity provider.
    pub identifier: String,
    /// Role of the user.
    pub role: UserRole,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional contact email.
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    /// Creates a record with no profile details.
    #[must_use]
    pub fn new(identifier: impl Into<String>, role: UserRole) -> Self {
        Self {
            identifier: identifier.into(),
            role,
            display_name: None,
            email: None,
        }
    }

    /// Returns `true` if the record carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_known_values() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("customer".parse::<UserRole>(), Ok(UserRole::Customer));
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_admin_role_is_admin() {
        assert!(UserRecord::new("u1", UserRole::Admin).is_admin());
        assert!(!UserRecord::new("u2", UserRole::Customer).is_admin());
    }
}
