//! Green Leaf Credential Store
//!
//! Persistence seam for user records and password-reset tokens. The
//! PostgreSQL implementation lives in `greenleaf-db`; this crate carries the
//! trait and an in-memory backend for development and tests.

use chrono::{DateTime, Utc};
use greenleaf_core::{NewUser, PasswordResetToken, ProfileUpdate, User, UserId};
use thiserror::Error;

mod memory;

pub use memory::InMemoryCredentialStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// The reset token does not exist, was already used, or has expired
    #[error("Reset token unavailable")]
    TokenUnavailable,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Trait for credential storage backends.
///
/// Implementations must make `consume_reset_token` an atomic
/// compare-and-swap on the token's `used` flag: of any number of concurrent
/// calls with the same token, at most one succeeds.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user. Fails with `Duplicate` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Return the user with `user.id`, inserting `user` if there is none
    async fn get_or_create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Apply a profile edit. Fails with `Duplicate` when the new email
    /// belongs to another user.
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User, StoreError>;

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), StoreError>;

    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<(), StoreError>;

    async fn find_reset_token(&self, token_hash: &str)
        -> Result<Option<PasswordResetToken>, StoreError>;

    /// Mark the token used and set the owner's password hash in one step.
    ///
    /// Fails with `TokenUnavailable` unless the token exists, is unused and
    /// `now < expires_at`; nothing is changed in that case.
    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, StoreError>;

    /// Drop consumed and expired tokens, returning how many were removed
    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}
