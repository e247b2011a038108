//! Bearer-token guard for protected operations.
//!
//! A pure function from the raw `Authorization` header value to a verified
//! identity. The transport layer decides what to do with the result.

use std::sync::Arc;

use super::{IdentityClaim, TokenService, VerificationFailure};

/// Why a request was not authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    /// No header, wrong scheme, or an empty token.
    TokenMissing,
    /// The token did not verify. `reason` is for diagnostics only.
    TokenInvalid { reason: VerificationFailure },
}

impl std::fmt::Display for GuardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenMissing => write!(f, "token not provided"),
            // The reason is deliberately not rendered.
            Self::TokenInvalid { .. } => write!(f, "invalid token"),
        }
    }
}

impl std::error::Error for GuardError {}

/// Extracts and verifies bearer tokens.
#[derive(Clone)]
pub struct AccessGuard {
    tokens: Arc<TokenService>,
}

impl AccessGuard {
    #[must_use]
    pub const fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Authorize a request from its `Authorization` header value.
    ///
    /// # Errors
    /// - `GuardError::TokenMissing` if no bearer token can be extracted.
    /// - `GuardError::TokenInvalid` if the token is malformed or expired.
    pub fn authorize(&self, header: Option<&str>) -> Result<IdentityClaim, GuardError> {
        let token = header
            .and_then(extract_bearer)
            .ok_or(GuardError::TokenMissing)?;

        self.tokens.verify(token).map_err(|reason| {
            tracing::warn!("Rejected bearer token: {reason}");
            GuardError::TokenInvalid { reason }
        })
    }
}

/// Pull the token out of a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively.
fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}
