//! Account roles.

use std::fmt;

use serde::Serialize;

/// The role flag carried by every account.
///
/// Only two roles exist. On the wire they appear as `"NORMAL"` and `"ADMIN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Normal,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
