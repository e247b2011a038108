//! Account storage contract.
//!
//! The authentication core does not own persistence. It talks to whatever
//! record store the process wires in through [`AccountStore`], keyed by the
//! normalized email address.
//!
//! # Invariants
//! - Email uniqueness is enforced by the store on `insert`. A losing
//!   concurrent insert gets `StoreError::UniquenessViolation`, never an
//!   overwrite.
//! - No store lock is held across an `.await`.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::types::{Account, Email};

/// Errors reported by an account store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An account with this email already exists.
    UniquenessViolation(Email),
    /// The store could not complete the operation.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniquenessViolation(email) => {
                write!(f, "an account with email '{email}' already exists")
            }
            Self::Unavailable(reason) => write!(f, "account store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Email-keyed account lookup and insertion.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by normalized email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError>;

    /// Whether an account with this email exists.
    async fn exists(&self, email: &Email) -> Result<bool, StoreError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    /// Insert a new account.
    ///
    /// # Errors
    /// Returns `StoreError::UniquenessViolation` if the email is taken.
    async fn insert(&self, account: Account) -> Result<(), StoreError>;
}

/// In-process account store.
///
/// Backs the server binary and the tests. Records live only as long as the
/// process.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Email, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the lock is poisoned.
    pub fn count(&self) -> Result<usize, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.len())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("account map lock poisoned".to_string())
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(email).cloned())
    }

    async fn insert(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.contains_key(&account.email) {
            return Err(StoreError::UniquenessViolation(account.email));
        }
        accounts.insert(account.email.clone(), account);
        Ok(())
    }
}
