//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JSON Web Tokens signed with a server-held secret.
//! Verification is stateless: signature, claims and expiry are all checked
//! from the token itself plus the secret and the current time.
//!
//! # Pre-conditions
//! - The signing secret is non-empty. An empty secret is rejected when the
//!   service is built, which is a fatal startup error.
//!
//! # Post-conditions
//! - Issued tokens stay valid for at least `TOKEN_TTL` after issuance and
//!   expire within one second after that. Expiry is rounded up to the whole
//!   second.
//! - `verify` classifies every rejection as either `Malformed` or `Expired`.
//!
//! # Invariants
//! - The service holds no mutable state; it is safe to share across tasks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::time::TimeSource;
use crate::types::AccountId;

/// Fixed validity window of an issued token.
pub const TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Identity asserted by a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub account_id: AccountId,
    pub email: String,
}

/// Wire claims. Times are whole seconds since Unix epoch.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: u64,
    exp: u64,
}

/// Error returned when the token service cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    /// The signing secret is empty.
    EmptySecret,
}

impl fmt::Display for TokenConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "token signing secret must not be empty"),
        }
    }
}

impl std::error::Error for TokenConfigError {}

/// Error returned when signing a token fails.
#[derive(Debug)]
pub enum TokenError {
    Signing(jsonwebtoken::errors::Error),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signing(e) => write!(f, "failed to sign token: {e}"),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Signing(e) => Some(e),
        }
    }
}

/// Why a presented token was rejected.
///
/// Both variants are rejected the same way by callers. The distinction is
/// kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
    /// Structurally invalid, bad signature, or missing/invalid claims.
    Malformed,
    /// Valid signature, but the expiry has passed.
    Expired,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed token"),
            Self::Expired => write!(f, "token has expired"),
        }
    }
}

impl std::error::Error for VerificationFailure {}

/// Signs and verifies bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn TimeSource>,
}

impl TokenService {
    /// Build a token service for the given secret.
    ///
    /// # Errors
    /// Returns `TokenConfigError::EmptySecret` if `secret` is empty.
    pub fn new(secret: &[u8], clock: Arc<dyn TimeSource>) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `verify`, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    /// Issue a token for `claim`, valid for at least `TOKEN_TTL` from now.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue(&self, claim: &IdentityClaim) -> Result<String, TokenError> {
        let now_ms = self.clock.now_ms();
        let claims = Claims {
            sub: claim.account_id.to_string(),
            email: claim.email.clone(),
            iat: now_ms / 1000,
            exp: now_ms.div_ceil(1000).saturating_add(TOKEN_TTL.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Verify a token and extract its identity claim.
    ///
    /// # Errors
    /// Returns `VerificationFailure::Expired` for a correctly signed token
    /// past its expiry and `VerificationFailure::Malformed` for everything else.
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, VerificationFailure> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if claims.exp <= self.clock.now_secs() {
            return Err(VerificationFailure::Expired);
        }

        let account_id = claims
            .sub
            .parse::<AccountId>()
            .map_err(|_| VerificationFailure::Malformed)?;

        Ok(IdentityClaim {
            account_id,
            email: claims.email,
        })
    }
}

/// Maps jsonwebtoken errors to a verification failure class.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> VerificationFailure {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::ExpiredSignature => VerificationFailure::Expired,
        _ => VerificationFailure::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimeSource;

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough";

    fn service_with_clock() -> (TokenService, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::default_start());
        let service = TokenService::new(SECRET, Arc::clone(&clock) as Arc<dyn TimeSource>).unwrap();
        (service, clock)
    }

    fn claim() -> IdentityClaim {
        IdentityClaim {
            account_id: AccountId([3u8; 16]),
            email: "admin@gmail.com".to_string(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let (service, _) = service_with_clock();
        let token = service.issue(&claim()).unwrap();

        assert_eq!(service.verify(&token), Ok(claim()));
    }

    #[test]
    fn test_token_valid_until_just_before_expiry() {
        let (service, clock) = service_with_clock();
        let token = service.issue(&claim()).unwrap();

        let ttl_ms: u64 = TOKEN_TTL.as_millis().try_into().unwrap();
        clock.advance(ttl_ms - 1_000);
        assert_eq!(service.verify(&token), Ok(claim()));
    }

    #[test]
    fn test_token_expired_after_ttl() {
        let (service, clock) = service_with_clock();
        let token = service.issue(&claim()).unwrap();

        clock.advance(TOKEN_TTL.as_millis().try_into().unwrap());
        assert_eq!(service.verify(&token), Err(VerificationFailure::Expired));
    }

    #[test]
    fn test_sub_second_issuance_keeps_full_ttl() {
        let clock = Arc::new(ManualTimeSource::new(1_700_000_000_500));
        let service = TokenService::new(SECRET, Arc::clone(&clock) as Arc<dyn TimeSource>).unwrap();
        let token = service.issue(&claim()).unwrap();

        let ttl_ms: u64 = TOKEN_TTL.as_millis().try_into().unwrap();
        clock.advance(ttl_ms);
        assert!(service.verify(&token).is_ok());

        clock.advance(500);
        assert_eq!(service.verify(&token), Err(VerificationFailure::Expired));
    }

    #[test]
    fn test_altered_trailing_character_is_malformed() {
        let (service, _) = service_with_clock();
        let mut token = service.issue(&claim()).unwrap();

        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(service.verify(&token), Err(VerificationFailure::Malformed));
    }

    #[test]
    fn test_tampered_payload_is_malformed() {
        let (service, _) = service_with_clock();
        let other = IdentityClaim {
            account_id: AccountId([9u8; 16]),
            email: "intruder@example.com".to_string(),
        };
        let token = service.issue(&claim()).unwrap();
        let forged_source = service.issue(&other).unwrap();

        // Splice the other token's payload into this token's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_source.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(service.verify(&spliced), Err(VerificationFailure::Malformed));
    }

    #[test]
    fn test_other_secret_is_malformed() {
        let (service, clock) = service_with_clock();
        let other = TokenService::new(b"a-completely-different-secret", clock).unwrap();
        let token = other.issue(&claim()).unwrap();

        assert_eq!(service.verify(&token), Err(VerificationFailure::Malformed));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (service, _) = service_with_clock();
        for input in ["", "not-a-valid-jwt", "a.b.c", "....", "Bearer x"] {
            assert_eq!(
                service.verify(input),
                Err(VerificationFailure::Malformed),
                "input: {input:?}"
            );
        }
    }

    #[test]
    fn test_missing_exp_claim_is_malformed() {
        #[derive(Serialize)]
        struct NoExpiry {
            sub: String,
            iat: u64,
        }

        let (service, clock) = service_with_clock();
        let claims = NoExpiry {
            sub: AccountId([1u8; 16]).to_string(),
            iat: clock.now_secs(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service.verify(&token), Err(VerificationFailure::Malformed));
    }

    #[test]
    fn test_non_account_subject_is_malformed() {
        let (service, clock) = service_with_clock();
        let now = clock.now_secs();
        let claims = Claims {
            sub: "user-123".to_string(),
            email: "a@b.c".to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(service.verify(&token), Err(VerificationFailure::Malformed));
    }

    #[test]
    fn test_new_empty_secret() {
        let clock = Arc::new(ManualTimeSource::default_start());
        let result = TokenService::new(b"", clock);
        assert!(matches!(result, Err(TokenConfigError::EmptySecret)));
    }

    #[test]
    fn test_token_ttl_is_one_day() {
        assert_eq!(TOKEN_TTL.as_secs(), 86_400);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TokenConfigError::EmptySecret.to_string(),
            "token signing secret must not be empty"
        );
        assert_eq!(VerificationFailure::Malformed.to_string(), "malformed token");
        assert_eq!(VerificationFailure::Expired.to_string(), "token has expired");
    }
}
