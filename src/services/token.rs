//! Session token service
//!
//! Tokens are stateless: `base64url(claims) "." base64url(HMAC-SHA256(key, first part))`
//! with claims `{sub, iat, exp}` in unix seconds. Nothing is persisted server-side,
//! so a token stays valid until `exp` regardless of client logout.

use anyhow::{Context, Result};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

/// Size of the key generated when no secret is configured
const GENERATED_KEY_LEN: usize = 32;

/// Token verification failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Malformed, tampered with, or signed with another key
    #[error("Invalid token")]
    Invalid,

    /// Correctly signed but past its expiry
    #[error("Token expired")]
    Expired,
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and verifies signed session tokens
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service with an explicit key and lifetime
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow::anyhow!("Invalid token key: {}", e))?;
        Ok(Self { mac, ttl })
    }

    /// Create a token service from the auth configuration.
    ///
    /// Without a configured secret a random key is generated, so tokens do
    /// not survive a restart.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let hours = config.token_ttl_hours.max(1);
        let ttl = Duration::try_hours(hours)
            .ok_or_else(|| anyhow::anyhow!("auth.token_ttl_hours is out of range: {}", hours))?;

        match config.token_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes(), ttl),
            None => {
                tracing::warn!(
                    "No auth.token_secret configured, generating a random key; \
                     issued tokens will not survive a restart"
                );
                let mut key = [0u8; GENERATED_KEY_LEN];
                OsRng.fill_bytes(&mut key);
                Self::new(&key, ttl)
            }
        }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user_id: i64) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        let payload = serde_json::to_vec(&claims).context("Failed to encode token claims")?;
        let payload = BASE64URL_NOPAD.encode(&payload);
        let signature = BASE64URL_NOPAD.encode(&self.sign(payload.as_bytes()));

        Ok(format!("{}.{}", payload, signature))
    }

    /// Verify a token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The signature is checked before the claims are decoded.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Invalid)?;

        let signature = BASE64URL_NOPAD
            .decode(signature.as_bytes())
            .map_err(|_| TokenError::Invalid)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let claims = BASE64URL_NOPAD
            .decode(payload.as_bytes())
            .map_err(|_| TokenError::Invalid)?;
        let claims: Claims = serde_json::from_slice(&claims).map_err(|_| TokenError::Invalid)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
