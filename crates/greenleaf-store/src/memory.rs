//! In-memory credential store (for development/testing)

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use greenleaf_core::user::normalize_email;
use greenleaf_core::{NewUser, PasswordResetToken, ProfileUpdate, User, UserId};

use crate::{CredentialStore, StoreError};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    /// normalised email -> owner
    emails: HashMap<String, UserId>,
    /// token digest -> record
    reset_tokens: HashMap<String, PasswordResetToken>,
}

/// All records live behind one lock so multi-record updates are atomic
#[derive(Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Storage(e.to_string()))
    }
}

impl Inner {
    fn insert_user(&mut self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user(Utc::now());
        if self.emails.contains_key(&user.email) {
            return Err(StoreError::Duplicate(user.email));
        }
        if self.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(user.id.to_string()));
        }
        self.emails.insert(user.email.clone(), user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.write()?.insert_user(user)
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .emails
            .get(&normalize_email(email))
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn get_or_create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.write()?;
        if let Some(existing) = inner.users.get(&user.id) {
            return Ok(existing.clone());
        }
        inner.insert_user(user)
    }

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User, StoreError> {
        let mut inner = self.write()?;

        let mut user = inner
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let old_email = user.email.clone();
        update.apply_to(&mut user);

        if user.email != old_email {
            if inner.emails.contains_key(&user.email) {
                return Err(StoreError::Duplicate(user.email));
            }
            inner.emails.remove(&old_email);
            inner.emails.insert(user.email.clone(), id.clone());
        }

        inner.users.insert(id.clone(), user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: &UserId, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        user.password_hash = Some(password_hash.to_string());
        Ok(())
    }

    async fn create_reset_token(&self, token: PasswordResetToken) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if !inner.users.contains_key(&token.user_id) {
            return Err(StoreError::NotFound(token.user_id.to_string()));
        }
        inner.reset_tokens.insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn find_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetToken>, StoreError> {
        Ok(self.read()?.reset_tokens.get(token_hash).cloned())
    }

    async fn consume_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<UserId, StoreError> {
        let mut inner = self.write()?;

        let user_id = match inner.reset_tokens.get(token_hash) {
            Some(token) if token.is_valid_at(now) => token.user_id.clone(),
            _ => return Err(StoreError::TokenUnavailable),
        };

        // Check the owner before touching anything so a failure leaves both
        // records unchanged.
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::TokenUnavailable)?;
        user.password_hash = Some(password_hash.to_string());

        if let Some(token) = inner.reset_tokens.get_mut(token_hash) {
            token.used = true;
        }

        Ok(user_id)
    }

    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut inner = self.write()?;
        let before = inner.reset_tokens.len();
        inner.reset_tokens.retain(|_, t| !t.is_collectable_at(now));
        let removed = before - inner.reset_tokens.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged reset tokens");
        }
        Ok(removed)
    }
}
