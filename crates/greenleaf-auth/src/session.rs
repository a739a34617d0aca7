//! Server-signed session tokens

use chrono::Utc;
use greenleaf_core::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (sub) - user id
    pub sub: String,

    /// Issued at (iat)
    pub iat: u64,

    /// Expiration time (exp)
    pub exp: u64,
}

impl SessionClaims {
    pub fn new(user_id: &UserId, ttl_seconds: u64) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self {
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }
}

/// Issues and verifies HS256 session tokens
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Sign a token for `user_id`
    pub fn issue(&self, user_id: &UserId) -> Result<String, AuthError> {
        self.sign(&SessionClaims::new(user_id, self.ttl_seconds))
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
