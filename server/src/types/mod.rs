//! Domain types shared by the authentication core.

pub mod account;
pub mod email;
pub mod ids;
pub mod role;

pub use account::{Account, AccountSummary};
pub use email::{Email, EmailError};
pub use ids::{AccountId, ParseAccountIdError};
pub use role::Role;
