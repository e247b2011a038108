//! Normalized email addresses.
//!
//! Account uniqueness is decided on the normalized form, so every lookup and
//! insert goes through [`Email`].

use std::fmt;

/// An email address in normalized form (trimmed, lowercased).
///
/// # Invariants
///
/// - The inner string is never empty.
/// - The inner string has no leading or trailing whitespace.
/// - The inner string has no uppercase characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Email(String);

/// Error returned when an email address cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The address is empty after trimming.
    Empty,
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "email must not be empty"),
        }
    }
}

impl std::error::Error for EmailError {}

impl Email {
    /// Normalize a raw email address.
    ///
    /// # Examples
    ///
    /// ```
    /// use authn::types::Email;
    /// let email = Email::parse("  Admin@Gmail.COM ").unwrap();
    /// assert_eq!(email.as_str(), "admin@gmail.com");
    /// ```
    ///
    /// # Errors
    /// Returns `EmailError::Empty` if nothing remains after trimming.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
