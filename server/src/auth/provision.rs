//! Idempotent seeding of well-known accounts.
//!
//! # Pre-conditions
//! - The store enforces email uniqueness on insert.
//!
//! # Post-conditions
//! - Every input entry gets exactly one outcome in the report, in input order.
//! - Re-running `seed` with the same input creates nothing new and reports
//!   every entry as skipped.
//!
//! # Invariants
//! - A failure on one entry never stops the remaining entries.
//! - Seeding is not transactional across entries.

use std::sync::Arc;

use super::{AccountStore, PasswordHasher, StoreError};
use crate::time::TimeSource;
use crate::types::{Account, AccountId, Email, Role};

/// One account to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl SeedAccount {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }
}

/// The well-known accounts every deployment starts with.
#[must_use]
pub fn default_seed_accounts() -> Vec<SeedAccount> {
    vec![
        SeedAccount::new("admin@gmail.com", "admin", Role::Admin),
        SeedAccount::new("2022371010@uteq.edu.mx", "123456789", Role::Normal),
    ]
}

/// What happened to one seed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// A new account was inserted.
    Created(AccountId),
    /// An account with this email already existed.
    Skipped,
    /// The entry could not be provisioned.
    Failed(String),
}

/// Outcome for one entry, keyed by the (normalized where possible) email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedEntryReport {
    pub email: String,
    pub outcome: SeedOutcome,
}

/// Per-entry results of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub entries: Vec<SeedEntryReport>,
}

impl SeedReport {
    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Created(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Skipped))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SeedOutcome::Failed(_)))
    }

    /// True if no entry failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&SeedOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }
}

/// Provisions accounts into a store.
pub struct AccountProvisioner {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    clock: Arc<dyn TimeSource>,
}

impl AccountProvisioner {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
        }
    }

    /// Seed `accounts` in order, one outcome per entry.
    pub async fn seed(&self, accounts: &[SeedAccount]) -> SeedReport {
        let mut report = SeedReport::default();

        for entry in accounts {
            let Ok(email) = Email::parse(&entry.email) else {
                tracing::error!("Skipping seed entry with empty email");
                report.entries.push(SeedEntryReport {
                    email: entry.email.clone(),
                    outcome: SeedOutcome::Failed("email must not be empty".to_string()),
                });
                continue;
            };

            let outcome = self.seed_one(&email, entry).await;
            match &outcome {
                SeedOutcome::Created(id) => {
                    tracing::info!("Created account {email} ({}) id={id}", entry.role);
                }
                SeedOutcome::Skipped => {
                    tracing::info!("Account {email} already exists, skipping");
                }
                SeedOutcome::Failed(reason) => {
                    tracing::error!("Failed to provision account {email}: {reason}");
                }
            }
            report.entries.push(SeedEntryReport {
                email: email.to_string(),
                outcome,
            });
        }

        tracing::info!(
            "Seeding finished: created={}, skipped={}, failed={}",
            report.created(),
            report.skipped(),
            report.failed()
        );
        report
    }

    async fn seed_one(&self, email: &Email, entry: &SeedAccount) -> SeedOutcome {
        match self.store.exists(email).await {
            Ok(true) => return SeedOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return SeedOutcome::Failed(e.to_string()),
        }

        let password_hash = match self.hasher.hash(&entry.password).await {
            Ok(hash) => hash,
            Err(e) => return SeedOutcome::Failed(e.to_string()),
        };

        let account = Account {
            id: AccountId::generate(),
            email: email.clone(),
            password_hash,
            role: entry.role,
            created_at_ms: self.clock.now_ms(),
        };
        let id = account.id;

        match self.store.insert(account).await {
            Ok(()) => SeedOutcome::Created(id),
            // Another writer got there first; same as the pre-check finding it.
            Err(StoreError::UniquenessViolation(_)) => SeedOutcome::Skipped,
            Err(e) => SeedOutcome::Failed(e.to_string()),
        }
    }
}
