//! `CredentialStore` backed by PostgreSQL

use chrono::{DateTime, Utc};
use greenleaf_core::{NewUser, PasswordResetToken, ProfileUpdate, User, UserId};
use greenleaf_store::{CredentialStore, StoreError};

use crate::pool::DatabasePool;

pub struct PgCredentialStore {
    db: DatabasePool,
}

impl PgCredentialStore {
    pub fn new(db: &DatabasePool) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(self.db.users().create(user).await?)
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.db.users().find_by_id(id.as_str()).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.db.users().find_by_email(email).await?)
    }

    async fn get_or_create_user(&self, user: NewUser) -> Result<User, StoreError> {
        Ok(self.db.users().create_if_absent(user).await?)
    }

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User, StoreError> {
        Ok(self.db.users().update_profile(id.as_str(), update).await?)
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), StoreError> {
        Ok(self
            .db
            .users()
            .update_password(id.as_str(), password_hash)
            .await?)
    }

    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<(), StoreError> {
        Ok(self.db.reset_tokens().create(&token).await?)
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(self.db.reset_tokens().find_by_hash(token_hash).await?)
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, StoreError> {
        self.db
            .reset_tokens()
            .consume(token_hash, password_hash, now)
            .await?
            .map(UserId::new)
            .ok_or(StoreError::TokenUnavailable)
    }

    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.db.reset_tokens().cleanup_expired(now).await?;
        Ok(removed as usize)
    }
}
