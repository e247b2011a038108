//! Login orchestration.
//!
//! Turns an (email, password) pair into a signed token plus an account
//! summary, or a typed rejection.
//!
//! # Post-conditions
//! - An unknown email and a wrong password produce the same error, and
//!   both pay for one bcrypt verification.
//! - Infrastructure failures are logged here and surfaced as
//!   `AuthError::Internal` without detail.
//! - The returned summary carries no credential material.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{
    AccountStore, IdentityClaim, PasswordError, PasswordHash, PasswordHasher, TokenService,
};
use crate::types::{AccountSummary, Email};

/// Plaintext behind the hash checked when no account matches.
const DUMMY_PASSWORD: &str = "no-such-account";

/// Reasons a login attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Email or password was empty.
    MissingCredentials,
    /// No such account, or the password did not match.
    InvalidCredentials,
    /// The store, hasher or signer failed.
    Internal,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Internal => write!(f, "internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub token: String,
    pub account: AccountSummary,
}

/// Verifies credentials and issues tokens.
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    /// Hashed on first use with the configured work factor.
    dummy_hash: OnceCell<PasswordHash>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Authenticate a user.
    ///
    /// # Errors
    /// - `AuthError::MissingCredentials` if either field is empty. Checked
    ///   before the store is touched.
    /// - `AuthError::InvalidCredentials` if the account does not exist or
    ///   the password does not match.
    /// - `AuthError::Internal` on store, hashing or signing failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        if password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let email = Email::parse(email).map_err(|_| AuthError::MissingCredentials)?;

        let account = match self.store.find_by_email(&email).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                self.verify_dummy(password).await?;
                tracing::debug!("Login rejected for {email}: no such account");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                tracing::error!("Account lookup failed for {email}: {e}");
                return Err(AuthError::Internal);
            }
        };

        let checked = self.hasher.try_verify(password, &account.password_hash).await;
        password_outcome(checked).inspect_err(|e| {
            if *e == AuthError::InvalidCredentials {
                tracing::debug!("Login rejected for {email}: password mismatch");
            }
        })?;

        let claim = IdentityClaim {
            account_id: account.id,
            email: account.email.to_string(),
        };
        let token = self.tokens.issue(&claim).map_err(|e| {
            tracing::error!("Failed to issue token for {email}: {e}");
            AuthError::Internal
        })?;

        tracing::info!("Login succeeded for {email}");
        Ok(LoginResult {
            token,
            account: account.summary(),
        })
    }

    /// Run one bcrypt verification against a fixed hash, so a miss costs the
    /// same as a wrong password.
    async fn verify_dummy(&self, password: &str) -> Result<(), AuthError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
            .await
            .map_err(|e| {
                tracing::error!("Failed to prepare dummy password hash: {e}");
                AuthError::Internal
            })?;

        match password_outcome(self.hasher.try_verify(password, dummy).await) {
            Err(AuthError::Internal) => Err(AuthError::Internal),
            _ => Ok(()),
        }
    }
}

/// Map a password check onto the login error taxonomy.
fn password_outcome(checked: Result<bool, PasswordError>) -> Result<(), AuthError> {
    match checked {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::InvalidCredentials),
        Err(e) => {
            tracing::error!("Password verification failed: {e}");
            Err(AuthError::Internal)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::auth::{
        AccountProvisioner, MemoryAccountStore, SeedAccount, StoreError, default_seed_accounts,
    };
    use crate::time::{ManualTimeSource, TimeSource};
    use crate::types::{Account, Role};

    const SECRET: &[u8] = b"login-test-secret";

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordHasher::MIN_COST).unwrap()
    }

    fn token_service() -> Arc<TokenService> {
        let clock: Arc<dyn TimeSource> = Arc::new(ManualTimeSource::default_start());
        Arc::new(TokenService::new(SECRET, clock).unwrap())
    }

    async fn seeded_service() -> (AuthService, Arc<TokenService>) {
        let store = Arc::new(MemoryAccountStore::new());
        AccountProvisioner::new(
            store.clone(),
            hasher(),
            Arc::new(ManualTimeSource::default_start()),
        )
        .seed(&default_seed_accounts())
        .await;

        let tokens = token_service();
        (AuthService::new(store, hasher(), Arc::clone(&tokens)), tokens)
    }

    /// Counts lookups and always fails them.
    struct DownStore {
        lookups: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl AccountStore for DownStore {
        async fn find_by_email(&self, _email: &Email) -> Result<Option<Account>, StoreError> {
            self.lookups
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(StoreError::Unavailable("timeout".to_string()))
        }

        async fn insert(&self, _account: Account) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn test_login_seeded_admin() {
        let (service, tokens) = seeded_service().await;

        let result = service.login("admin@gmail.com", "admin").await.unwrap();

        assert_eq!(result.account.email, "admin@gmail.com");
        assert_eq!(result.account.role, Role::Admin);

        let claim = tokens.verify(&result.token).unwrap();
        assert_eq!(claim.account_id.to_string(), result.account.id);
        assert_eq!(claim.email, "admin@gmail.com");
    }

    #[tokio::test]
    async fn test_login_normalizes_email() {
        let (service, _) = seeded_service().await;
        let result = service.login("  ADMIN@gmail.com ", "admin").await.unwrap();
        assert_eq!(result.account.email, "admin@gmail.com");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
        let (service, _) = seeded_service().await;

        let wrong_password = service.login("admin@gmail.com", "nope").await;
        let unknown_email = service.login("ghost@gmail.com", "admin").await;

        assert_eq!(wrong_password, Err(AuthError::InvalidCredentials));
        assert_eq!(unknown_email, Err(AuthError::InvalidCredentials));
        assert_eq!(
            wrong_password.unwrap_err().to_string(),
            unknown_email.unwrap_err().to_string()
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_precede_store_access() {
        let store = Arc::new(DownStore {
            lookups: std::sync::atomic::AtomicUsize::new(0),
        });
        let service = AuthService::new(store.clone(), hasher(), token_service());

        assert_eq!(
            service.login("", "admin").await,
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            service.login("   ", "admin").await,
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            service.login("admin@gmail.com", "").await,
            Err(AuthError::MissingCredentials)
        );
        assert_eq!(
            store.lookups.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let store = Arc::new(DownStore {
            lookups: std::sync::atomic::AtomicUsize::new(0),
        });
        let service = AuthService::new(store, hasher(), token_service());

        assert_eq!(
            service.login("admin@gmail.com", "admin").await,
            Err(AuthError::Internal)
        );
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_invalid_credentials() {
        let store = Arc::new(MemoryAccountStore::new());
        store
            .insert(Account {
                id: crate::types::AccountId::generate(),
                email: Email::parse("broken@example.com").unwrap(),
                password_hash: crate::auth::PasswordHash::from_stored("garbage".to_string()),
                role: Role::Normal,
                created_at_ms: 0,
            })
            .await
            .unwrap();
        let service = AuthService::new(store, hasher(), token_service());

        assert_eq!(
            service.login("broken@example.com", "garbage").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_login_normal_user_role() {
        let store = Arc::new(MemoryAccountStore::new());
        AccountProvisioner::new(
            store.clone(),
            hasher(),
            Arc::new(ManualTimeSource::default_start()),
        )
        .seed(&[SeedAccount::new("student@uteq.edu.mx", "123456789", Role::Normal)])
        .await;
        let service = AuthService::new(store, hasher(), token_service());

        let result = service
            .login("student@uteq.edu.mx", "123456789")
            .await
            .unwrap();
        assert_eq!(result.account.role, Role::Normal);
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_a_verification() {
        let (service, _) = seeded_service().await;
        assert!(!service.dummy_hash.initialized());

        let result = service.login("ghost@gmail.com", "admin").await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
        assert!(service.dummy_hash.initialized());
    }

    #[tokio::test]
    async fn test_known_email_skips_dummy_hash() {
        let (service, _) = seeded_service().await;
        let _ = service.login("admin@gmail.com", "wrong").await;
        assert!(!service.dummy_hash.initialized());
    }

    #[test]
    fn test_failed_verification_task_is_internal() {
        assert_eq!(
            password_outcome(Err(PasswordError::TaskFailed("task cancelled".to_string()))),
            Err(AuthError::Internal)
        );
        assert_eq!(
            password_outcome(Ok(false)),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(password_outcome(Ok(true)), Ok(()));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::MissingCredentials.to_string(),
            "email and password are required"
        );
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
        assert_eq!(
            AuthError::Internal.to_string(),
            "internal authentication error"
        );
    }
}
