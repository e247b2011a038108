//! Authentication module.
//!
//! Password hashing, token issuance and verification, account provisioning,
//! login orchestration and the bearer-token guard.
//!
//! # Pre-conditions
//! - A non-empty token signing secret is configured at startup.
//!
//! # Post-conditions
//! - Every operation returns a typed failure; nothing panics across the
//!   transport boundary.
//!
//! # Invariants
//! - The signing secret and hashing work factor are immutable once loaded.
//! - No component holds shared mutable state beyond the account store.

pub mod guard;
pub mod password;
pub mod provision;
pub mod service;
pub mod store;
pub mod token;

pub use guard::{AccessGuard, GuardError};
pub use password::{PasswordError, PasswordHash, PasswordHasher};
pub use provision::{
    AccountProvisioner, SeedAccount, SeedEntryReport, SeedOutcome, SeedReport,
    default_seed_accounts,
};
pub use service::{AuthError, AuthService, LoginResult};
pub use store::{AccountStore, MemoryAccountStore, StoreError};
pub use token::{
    IdentityClaim, TOKEN_TTL, TokenConfigError, TokenError, TokenService, VerificationFailure,
};
