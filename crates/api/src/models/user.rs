//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use protech_core::{Email, UserId, UserRole};

/// An account (domain type).
///
/// Never carries the credential hash; that stays inside the repository and
/// the auth service.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: Email,
    /// Account role.
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may access the admin surface.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
