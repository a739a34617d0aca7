//! Password-reset token records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::user::UserId;

/// Unique identifier for a reset token record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResetTokenId(pub String);

impl ResetTokenId {
    pub fn generate() -> Self {
        Self(format!("rst_{}", uuid::Uuid::new_v4().simple()))
    }
}

/// A single-use password-reset token.
///
/// Only the SHA-256 digest of the opaque token is kept; the raw value
/// exists solely in the link mailed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: ResetTokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Create a fresh, unused token record for a raw token
    pub fn issue(user_id: UserId, raw_token: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: ResetTokenId::generate(),
            user_id,
            token_hash: digest_token(raw_token),
            expires_at: now + ttl,
            used: false,
            created_at: now,
        }
    }

    /// A token is usable iff it is unused and not yet expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Consumed or expired tokens may be garbage-collected
    pub fn is_collectable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_valid_at(now)
    }
}

/// Hex SHA-256 of a raw token, the lookup key in the store
pub fn digest_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}
