//! Signed bearer tokens.
//!
//! A token is `base64url(claims_json).hex(hmac_sha256(secret, payload))`,
//! where `payload` is the base64url segment. Claims carry the subject email
//! and a unix-seconds expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Expiry as unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[redacted]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// # Errors
    ///
    /// Returns [`TokenError::EmptySecret`] when `secret` is empty.
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| TokenError::EmptySecret)?;

        Ok(Self {
            mac,
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1_000)),
        })
    }

    #[must_use]
    pub fn issue(&self, email: &str) -> IssuedToken {
        self.issue_at(email, Utc::now())
    }

    #[must_use]
    pub fn issue_at(&self, email: &str, now: DateTime<Utc>) -> IssuedToken {
        let expires_at = now + self.ttl;
        let claims = Claims {
            email: email.to_owned(),
            exp: expires_at.timestamp(),
        };
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.sign(&payload);

        IssuedToken {
            access_token: format!("{payload}.{signature}"),
            token_type: "Bearer",
            expires_at,
        }
    }

    /// # Errors
    ///
    /// Returns [`TokenError`] when the token is malformed, its signature does
    /// not match, or it has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// # Errors
    ///
    /// See [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let expected = self.sign(payload);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(TokenError::BadSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        format!("{:x}", mac.finalize().into_bytes())
    }
}
