//! ID types for accounts.
//!
//! Account IDs are random 16-byte values. They travel inside signed tokens
//! as the `sub` claim, so they have a canonical textual form: 32 lowercase
//! hex characters.

use std::fmt;
use std::str::FromStr;

/// A unique identifier for an account.
///
/// # Invariants
///
/// - The ID is exactly 16 bytes.
/// - The textual form is always 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccountId(pub [u8; 16]);

impl AccountId {
    /// Length of the hex-encoded form.
    pub const HEX_LEN: usize = 32;

    /// Generate a fresh random account ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Error returned when parsing an account ID from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAccountIdError {
    /// The input is not exactly 32 characters long.
    InvalidLength(usize),
    /// The input contains a non-hex character.
    InvalidDigit,
}

impl fmt::Display for ParseAccountIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => {
                write!(f, "account id must be {} hex characters, got {len}", AccountId::HEX_LEN)
            }
            Self::InvalidDigit => write!(f, "account id contains a non-hex character"),
        }
    }
}

impl std::error::Error for ParseAccountIdError {}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    /// Parse the canonical hex form.
    ///
    /// # Examples
    ///
    /// ```
    /// use authn::types::AccountId;
    /// let id: AccountId = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
    /// assert_eq!(id.0[15], 0x0f);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(ParseAccountIdError::InvalidLength(s.len()));
        }

        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = s
                .get(i * 2..i * 2 + 2)
                .ok_or(ParseAccountIdError::InvalidDigit)?;
            *byte = u8::from_str_radix(pair, 16).map_err(|_| ParseAccountIdError::InvalidDigit)?;
        }
        Ok(Self(bytes))
    }
}
