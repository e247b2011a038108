//! Password hashing and verification.
//!
//! Passwords are hashed with bcrypt. Each hash embeds its own random salt and
//! work factor, so verification needs nothing beyond the stored string.
//!
//! # Pre-conditions
//! - The work factor is fixed at construction and lies in `MIN_COST..=MAX_COST`.
//!
//! # Post-conditions
//! - `hash` never returns the plaintext or anything reversible to it.
//! - `verify` never fails; every malformed input reads as "no match".
//!   `try_verify` additionally reports a failed verification task.
//! - Passwords longer than `MAX_PASSWORD_BYTES` are refused by `hash` and
//!   never verify. bcrypt ignores everything past that length, so accepting
//!   them would let distinct passwords share a hash.
//!
//! # Invariants
//! - Hashing runs on the blocking thread pool, never on an async worker.

use std::fmt;

/// Longest password bcrypt takes into account.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way password hash output in bcrypt's modular crypt format.
///
/// `Debug` is redacted and there is no `Display`, so hashes do not end up in
/// logs or responses by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash string that was read back from storage.
    #[must_use]
    pub const fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Error returned when hashing fails.
#[derive(Debug)]
pub enum PasswordError {
    /// The plaintext is empty.
    EmptyInput,
    /// The plaintext is longer than bcrypt can distinguish.
    TooLong(usize),
    /// The work factor is outside the supported range.
    InvalidCost(u32),
    /// bcrypt rejected the input.
    Hashing(bcrypt::BcryptError),
    /// The blocking hashing task panicked or was cancelled.
    TaskFailed(String),
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "password must not be empty"),
            Self::TooLong(len) => write!(
                f,
                "password is {len} bytes, longer than the {MAX_PASSWORD_BYTES}-byte limit"
            ),
            Self::InvalidCost(cost) => write!(
                f,
                "invalid bcrypt cost {cost}: must be between {} and {}",
                PasswordHasher::MIN_COST,
                PasswordHasher::MAX_COST
            ),
            Self::Hashing(e) => write!(f, "password hashing failed: {e}"),
            Self::TaskFailed(reason) => write!(f, "password hashing task failed: {reason}"),
        }
    }
}

impl std::error::Error for PasswordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hashing(e) => Some(e),
            Self::EmptyInput | Self::TooLong(_) | Self::InvalidCost(_) | Self::TaskFailed(_) => None,
        }
    }
}

/// Salted, deliberately slow password hasher.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Work factor used when none is configured.
    pub const DEFAULT_COST: u32 = 10;
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    /// Create a hasher with the given bcrypt work factor.
    ///
    /// # Errors
    /// Returns `PasswordError::InvalidCost` if `cost` is out of range.
    pub const fn new(cost: u32) -> Result<Self, PasswordError> {
        if cost < Self::MIN_COST || cost > Self::MAX_COST {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Two calls on the same input produce different outputs; both verify.
    ///
    /// # Errors
    /// Returns `PasswordError::EmptyInput` for an empty password, or a
    /// hashing/task error if the underlying computation fails.
    pub async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::EmptyInput);
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong(plaintext.len()));
        }

        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
            .map_err(PasswordError::Hashing)?;

        Ok(PasswordHash(hashed))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `false` on mismatch, on an empty or over-long plaintext, on a
    /// malformed hash, and if the verification task itself fails.
    pub async fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        self.try_verify(plaintext, hash).await.unwrap_or(false)
    }

    /// Check a plaintext password, separating "no match" from a failed task.
    ///
    /// `Ok(false)` covers mismatches and every malformed input.
    ///
    /// # Errors
    /// Returns `PasswordError::TaskFailed` if the blocking verification task
    /// panicked or was cancelled.
    pub async fn try_verify(
        &self,
        plaintext: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordError> {
        if plaintext.is_empty() || plaintext.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        let plaintext = plaintext.to_owned();
        let stored = hash.0.clone();
        let joined = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored)).await;
        verification_outcome(joined)
    }
}

/// Collapse a joined verification task into match / no match / task failure.
fn verification_outcome(
    joined: Result<bcrypt::BcryptResult<bool>, tokio::task::JoinError>,
) -> Result<bool, PasswordError> {
    match joined {
        Ok(Ok(matches)) => Ok(matches),
        Ok(Err(e)) => {
            tracing::debug!("stored password hash is malformed: {e}");
            Ok(false)
        }
        Err(e) => {
            tracing::error!("password verification task failed: {e}");
            Err(PasswordError::TaskFailed(e.to_string()))
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}
