//! Service configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `JWT_SECRET` | none, required |
//! | `JWT_EXPIRATION_HOURS` | `24`, between 1 and 87600 |
//! | `AUTH_CACHE_ENTRIES` | `10000`, `0` disables the cache |
//!
//! Database settings live with the store, see `PostgresConfig::from_env`.

use std::net::SocketAddr;
use std::str::FromStr;

use chrono::Duration;

use crate::auth::{CacheConfig, CredentialIssuer, CredentialVerifier, VerificationMode};

const DEV_JWT_SECRET: &str = "development_only_secret_not_for_production";

/// Upper bound for `JWT_EXPIRATION_HOURS` (ten years).
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 87_600;

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value as found in the environment.
        value: String,
    },
    /// A required variable is unset or empty.
    #[error("Missing required variable {0}")]
    Missing(&'static str),
    /// Host and port do not form a socket address.
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}

/// Configuration for the review service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// HS256 signing secret.
    pub jwt_secret: Vec<u8>,
    /// Credential lifetime in hours.
    pub jwt_expiration_hours: i64,
    /// Credential verification cache capacity.
    pub auth_cache_entries: usize,
}

/// Local development defaults.
///
/// Signs with a fixed, publicly known secret. [`ServiceConfig::from_env`]
/// never falls back to it.
impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: DEV_JWT_SECRET.as_bytes().to_vec(),
            jwt_expiration_hours: 24,
            auth_cache_entries: 10_000,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(s) if !s.is_empty() => s.into_bytes(),
            _ => {
                tracing::error!("JWT_SECRET not set or empty");
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
        };

        let jwt_expiration_hours: i64 =
            parse_or(&lookup, "JWT_EXPIRATION_HOURS", defaults.jwt_expiration_hours)?;
        if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&jwt_expiration_hours) {
            return Err(ConfigError::InvalidValue {
                var: "JWT_EXPIRATION_HOURS",
                value: jwt_expiration_hours.to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            jwt_secret,
            jwt_expiration_hours,
            auth_cache_entries: parse_or(&lookup, "AUTH_CACHE_ENTRIES", defaults.auth_cache_entries)?,
        })
    }

    /// Socket address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
    }

    /// Credential issuer for this configuration.
    ///
    /// Expects `jwt_expiration_hours` within `1..=MAX_JWT_EXPIRATION_HOURS`,
    /// as enforced by [`ServiceConfig::from_lookup`].
    pub fn issuer(&self) -> CredentialIssuer {
        CredentialIssuer::new(&self.jwt_secret, Duration::hours(self.jwt_expiration_hours))
    }

    /// Credential verifier for this configuration.
    pub fn verifier(&self) -> CredentialVerifier {
        let mode = if self.auth_cache_entries == 0 {
            VerificationMode::local_secret(self.jwt_secret.clone())
        } else {
            VerificationMode::cached_with_config(
                self.jwt_secret.clone(),
                CacheConfig {
                    max_entries: self.auth_cache_entries,
                    enabled: true,
                },
            )
        };
        CredentialVerifier::new(mode)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "x")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.auth_cache_entries, 10_000);
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRATION_HOURS", "2"),
            ("AUTH_CACHE_ENTRIES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(config.jwt_secret, b"s3cret".to_vec());
        assert_eq!(config.jwt_expiration_hours, 2);
        assert_eq!(config.verifier().cache_len(), None);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let err = ServiceConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_expiration_hours_out_of_range() {
        for value in ["-5", "0", "87601", "3000000000", "9999999999999"] {
            let err = ServiceConfig::from_lookup(lookup(&[
                ("JWT_SECRET", "x"),
                ("JWT_EXPIRATION_HOURS", value),
            ]))
            .unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    var: "JWT_EXPIRATION_HOURS",
                    value: value.to_string()
                }
            );
        }

        let config = ServiceConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("JWT_EXPIRATION_HOURS", "87600"),
        ]))
        .unwrap();
        let user = crate::types::User::new("u1", "Alice", "backend", true);
        assert!(config.issuer().issue(&user).is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let err = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "x"), ("PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "PORT",
                value: "eighty".to_string()
            }
        );

        let config = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "x"), ("HOST", "not a host")])).unwrap();
        assert!(matches!(config.socket_addr(), Err(ConfigError::InvalidAddress(_))));
    }

    #[test]
    fn test_issuer_matches_verifier() {
        let config = ServiceConfig::from_lookup(lookup(&[("JWT_SECRET", "shared")])).unwrap();
        let user = crate::types::User::new("u1", "Alice", "backend", true);

        let token = config.issuer().issue(&user).unwrap();
        assert_eq!(config.verifier().authenticate(&token).unwrap().as_str(), "u1");
    }
}
