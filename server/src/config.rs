//! Server configuration module.
//!
//! This module provides configuration loading for the authentication server
//! from environment variables.
//!
//! # Environment Variables
//!
//! - `AUTHN_JWT_SECRET`: Token signing secret (required, non-empty)
//! - `AUTHN_BCRYPT_COST`: bcrypt work factor (default: `10`, range 4-31)
//! - `AUTHN_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `AUTHN_SEED_DEFAULT_ACCOUNTS`: Provision the well-known accounts at
//!   startup (default: `true`)
//!
//! # Invariants
//!
//! - `jwt_secret` is never empty
//! - `bcrypt_cost` is always a work factor `PasswordHasher` accepts
//! - Configuration is read once at startup and never mutated

use crate::auth::PasswordHasher;

const JWT_SECRET_VAR: &str = "AUTHN_JWT_SECRET";
const BCRYPT_COST_VAR: &str = "AUTHN_BCRYPT_COST";
const LISTEN_PORT_VAR: &str = "AUTHN_LISTEN_PORT";
const SEED_DEFAULT_ACCOUNTS_VAR: &str = "AUTHN_SEED_DEFAULT_ACCOUNTS";

/// Server configuration.
///
/// # Post-conditions
///
/// - `jwt_secret` is non-empty
/// - `bcrypt_cost` is in `PasswordHasher::MIN_COST..=PasswordHasher::MAX_COST`
#[derive(Clone)]
pub struct ServerConfig {
    /// Secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Whether to provision the well-known accounts at startup.
    pub seed_default_accounts: bool,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("listen_port", &self.listen_port)
            .field("seed_default_accounts", &self.seed_default_accounts)
            .finish()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `AUTHN_JWT_SECRET` is not set or is empty
    /// - `AUTHN_BCRYPT_COST` is set but not a valid work factor
    /// - `AUTHN_LISTEN_PORT` is set but not a valid port number
    /// - `AUTHN_SEED_DEFAULT_ACCOUNTS` is set but not a boolean
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            jwt_secret: Self::load_jwt_secret(&lookup)?,
            bcrypt_cost: Self::load_bcrypt_cost(&lookup)?,
            listen_port: Self::load_listen_port(&lookup)?,
            seed_default_accounts: Self::load_seed_default_accounts(&lookup)?,
        })
    }

    fn load_jwt_secret(lookup: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        let secret =
            lookup(JWT_SECRET_VAR).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET_VAR.to_string()))?;

        if secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: JWT_SECRET_VAR.to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(secret)
    }

    fn load_bcrypt_cost(lookup: &impl Fn(&str) -> Option<String>) -> Result<u32, ConfigError> {
        let Some(value) = lookup(BCRYPT_COST_VAR) else {
            return Ok(PasswordHasher::DEFAULT_COST);
        };

        let invalid = || ConfigError::InvalidValue {
            name: BCRYPT_COST_VAR.to_string(),
            message: format!(
                "'{value}' is not a valid work factor (must be {}-{})",
                PasswordHasher::MIN_COST,
                PasswordHasher::MAX_COST
            ),
        };

        let cost = value.trim().parse::<u32>().map_err(|_| invalid())?;
        PasswordHasher::new(cost).map_err(|_| invalid())?;
        Ok(cost)
    }

    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup(LISTEN_PORT_VAR) {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port != 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: LISTEN_PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    fn load_seed_default_accounts(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<bool, ConfigError> {
        let Some(value) = lookup(SEED_DEFAULT_ACCOUNTS_VAR) else {
            return Ok(true);
        };

        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: SEED_DEFAULT_ACCOUNTS_VAR.to_string(),
                message: format!("'{value}' is not a boolean"),
            }),
        }
    }

    /// Build the password hasher described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `bcrypt_cost` is out of range, which `from_lookup`
    /// already rules out.
    pub fn password_hasher(&self) -> Result<PasswordHasher, ConfigError> {
        PasswordHasher::new(self.bcrypt_cost).map_err(|e| ConfigError::InvalidValue {
            name: BCRYPT_COST_VAR.to_string(),
            message: e.to_string(),
        })
    }
}
