//! Bearer credentials for the review API.
//!
//! Credentials are HS256 JWTs carrying the user id and team. The core only
//! needs the contract "user id in, opaque credential out; credential in,
//! user id out or rejection", which [`CredentialIssuer`] and
//! [`CredentialVerifier`] provide.
//!
//! ## Verification Modes
//!
//! | Mode | Use Case | Cost |
//! |------|----------|------|
//! | `LocalSecret` | Tests, low traffic | Signature check per request |
//! | `Cached` | Hot clients repeating one token | LRU hit, expiry still enforced |
//!
//! The cache is keyed by the SHA-256 of the token, so raw credentials are
//! never kept in memory past the request.

use std::num::NonZeroUsize;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{User, UserId};

/// Error type for credential operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Credential is malformed, forged, or expired.
    #[error("Invalid credential")]
    InvalidCredential,
    /// Credential could not be signed.
    #[error("Failed to sign credential: {0}")]
    Signing(String),
}

/// JWT claims carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated user.
    pub user_id: String,
    /// Team of the user at issue time.
    pub team_name: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues signed credentials.
#[derive(Clone)]
pub struct CredentialIssuer {
    key: EncodingKey,
    expiry: Duration,
}

impl CredentialIssuer {
    /// Create an issuer signing with `secret`; credentials live for `expiry`.
    pub fn new(secret: &[u8], expiry: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            expiry,
        }
    }

    /// Issue a credential for `user`.
    ///
    /// Fails with [`AuthError::Signing`] when the expiry falls outside the
    /// representable time range.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.expiry)
            .ok_or_else(|| AuthError::Signing("credential expiry out of range".to_string()))?;
        let claims = Claims {
            user_id: user.user_id.as_str().to_string(),
            team_name: user.team_name.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

/// Configuration for the credential verification cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            enabled: true,
        }
    }
}

/// Verification mode for bearer credentials.
#[derive(Debug, Clone)]
pub enum VerificationMode {
    /// Check the signature on every request.
    LocalSecret {
        /// Signing secret shared with the issuer.
        secret: Vec<u8>,
    },
    /// Check the signature once, then serve repeats from an LRU cache.
    Cached {
        /// Signing secret shared with the issuer.
        secret: Vec<u8>,
        /// Cache configuration.
        config: CacheConfig,
    },
}

impl VerificationMode {
    /// Create a local secret verification mode.
    pub fn local_secret(secret: Vec<u8>) -> Self {
        Self::LocalSecret { secret }
    }

    /// Create a cached verification mode with default configuration.
    pub fn cached(secret: Vec<u8>) -> Self {
        Self::Cached {
            secret,
            config: CacheConfig::default(),
        }
    }

    /// Create a cached verification mode with custom configuration.
    pub fn cached_with_config(secret: Vec<u8>, config: CacheConfig) -> Self {
        Self::Cached { secret, config }
    }

    fn secret(&self) -> &[u8] {
        match self {
            Self::LocalSecret { secret } => secret,
            Self::Cached { secret, .. } => secret,
        }
    }
}

/// Cache key: SHA-256 of the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CredentialCacheKey([u8; 32]);

impl CredentialCacheKey {
    fn compute(token: &str) -> Self {
        Self(Sha256::digest(token.as_bytes()).into())
    }
}

#[derive(Debug, Clone)]
struct CachedIdentity {
    user_id: UserId,
    exp: i64,
}

/// Result of a verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The user the credential was issued for.
    pub user_id: UserId,
    /// Whether this result came from cache.
    pub cache_hit: bool,
}

/// Verifies bearer credentials.
///
/// Thread-safe and suitable for sharing across request handlers. Only
/// successful verifications are cached, and a cached identity is dropped as
/// soon as its credential expires.
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
    cache: Option<RwLock<LruCache<CredentialCacheKey, CachedIdentity>>>,
}

impl CredentialVerifier {
    /// Create a new verifier with the specified mode.
    pub fn new(mode: VerificationMode) -> Self {
        let cache = match &mode {
            VerificationMode::Cached { config, .. } if config.enabled => {
                NonZeroUsize::new(config.max_entries).map(|size| RwLock::new(LruCache::new(size)))
            }
            _ => None,
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(mode.secret()),
            validation,
            cache,
        }
    }

    /// Resolve a credential to the user it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify(token).map(|a| a.user_id)
    }

    /// Resolve a credential, reporting whether the cache answered.
    pub fn verify(&self, token: &str) -> Result<Authenticated, AuthError> {
        let now = Utc::now().timestamp();

        let cache_key = self.cache.as_ref().map(|_| CredentialCacheKey::compute(token));

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            let hit = cache.read().peek(key).cloned();
            if let Some(identity) = hit {
                if identity.exp > now {
                    return Ok(Authenticated {
                        user_id: identity.user_id,
                        cache_hit: true,
                    });
                }
                cache.write().pop(key);
                return Err(AuthError::InvalidCredential);
            }
        }

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            AuthError::InvalidCredential
        })?;

        let user_id = UserId::new(data.claims.user_id);

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.write().put(
                key,
                CachedIdentity {
                    user_id: user_id.clone(),
                    exp: data.claims.exp,
                },
            );
        }

        Ok(Authenticated {
            user_id,
            cache_hit: false,
        })
    }

    /// Number of cached identities, or `None` when caching is disabled.
    pub fn cache_len(&self) -> Option<usize> {
        self.cache.as_ref().map(|c| c.read().len())
    }

    /// Clear the verification cache.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}
