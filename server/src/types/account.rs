//! The stored account record and its outward summary.

use serde::Serialize;

use super::{AccountId, Email, Role};
use crate::auth::PasswordHash;

/// One authenticable identity.
///
/// Accounts are created by provisioning (or an outside registration path)
/// and only read afterwards. There are no setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub role: Role,
    /// Creation time in milliseconds since Unix epoch.
    pub created_at_ms: u64,
}

impl Account {
    /// The caller-facing view of this account, without credential material.
    #[must_use]
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id.to_string(),
            email: self.email.to_string(),
            role: self.role,
        }
    }
}

/// Account details returned to a caller after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub email: String,
    pub role: Role,
}
