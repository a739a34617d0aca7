//! Local account management: registration, login, profile and password edits

use std::sync::Arc;

use greenleaf_core::validation::{validate_email, validate_name, validate_password};
use greenleaf_core::{GeoLocation, NewUser, ProfileUpdate, PublicUser, Role, UserId};
use greenleaf_store::CredentialStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::session::SessionSigner;

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub location: Option<GeoLocation>,
}

/// A signed-in user and their session token
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub token: String,
}

pub struct AccountService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    signer: Arc<SessionSigner>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        signer: Arc<SessionSigner>,
    ) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    pub fn session_ttl_seconds(&self) -> u64 {
        self.signer.ttl_seconds()
    }

    /// Create an account and sign it in
    pub async fn register(&self, registration: Registration) -> Result<LoginOutcome, AuthError> {
        validate_name(&registration.name)?;
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;
        if let Some(location) = registration.location {
            if !location.is_valid() {
                return Err(AuthError::Validation("Invalid location".into()));
            }
        }

        let password_hash = self.hasher.hash(&registration.password).await?;
        let user = self
            .store
            .create_user(NewUser {
                id: UserId::generate(),
                name: registration.name.trim().to_string(),
                email: registration.email,
                password_hash: Some(password_hash),
                role: registration.role,
                location: registration.location,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "Registered user");
        let token = self.signer.issue(&user.id)?;
        Ok(LoginOutcome {
            user: user.public(),
            token,
        })
    }

    /// Exchange email and password for a session.
    ///
    /// Unknown email and wrong password fail identically for the caller;
    /// only the log tells them apart.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            self.hasher.verify_dummy(password).await;
            warn!("Login failed: no account for email");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(stored_hash) = user.password_hash.as_deref() else {
            self.hasher.verify_dummy(password).await;
            warn!(user_id = %user.id, "Login failed: account has no local password");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, stored_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        let token = self.signer.issue(&user.id)?;
        Ok(LoginOutcome {
            user: user.public(),
            token,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<PublicUser, AuthError> {
        if update.is_empty() {
            return Err(AuthError::Validation("Nothing to update".into()));
        }
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(email) = &update.email {
            validate_email(email)?;
        }
        if let Some(location) = update.location {
            if !location.is_valid() {
                return Err(AuthError::Validation("Invalid location".into()));
            }
        }

        let user = self.store.update_profile(user_id, &update).await.map_err(|e| match e {
            greenleaf_store::StoreError::NotFound(_) => AuthError::UserNotFound,
            other => other.into(),
        })?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user.public())
    }

    /// Change the password of a signed-in user after re-checking the current one
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        let stored_hash = user.password_hash.as_deref().ok_or_else(|| {
            AuthError::Unsupported("This account has no password to change".into())
        })?;

        if !self.hasher.verify(current_password, stored_hash).await? {
            return Err(AuthError::Validation("Current password is incorrect".into()));
        }

        let new_hash = self.hasher.hash(new_password).await?;
        self.store.update_password(user_id, &new_hash).await?;
        info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenleaf_store::InMemoryCredentialStore;

    const SECRET: &[u8] = b"test_signing_key_32_bytes_long!!";

    fn service() -> (AccountService, Arc<SessionSigner>) {
        let signer = Arc::new(SessionSigner::new(SECRET, 7 * 24 * 3600));
        let service = AccountService::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::low_cost(),
            signer.clone(),
        );
        (service, signer)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Tunde".into(),
            email: email.into(),
            password: "leafy-greens-42".into(),
            role: Role::Farmer,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, signer) = service();
        let registered = service.register(registration("Tunde@Example.com")).await.unwrap();
        assert_eq!(registered.user.email, "tunde@example.com");

        let outcome = service.login("tunde@example.com", "leafy-greens-42").await.unwrap();
        assert_eq!(outcome.user.id, registered.user.id);
        assert_eq!(signer.verify(&outcome.token).unwrap().user_id(), registered.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (service, _) = service();
        service.register(registration("a@example.com")).await.unwrap();
        assert!(matches!(
            service.register(registration("A@EXAMPLE.com")).await,
            Err(AuthError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();
        service.register(registration("a@example.com")).await.unwrap();

        let wrong_password = service.login("a@example.com", "not-the-password").await.unwrap_err();
        let no_user = service.login("b@example.com", "leafy-greens-42").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(no_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), no_user.to_string());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _) = service();
        let mut bad = registration("not-an-email");
        assert!(matches!(service.register(bad.clone()).await, Err(AuthError::Validation(_))));

        bad.email = "ok@example.com".into();
        bad.password = "short".into();
        assert!(matches!(service.register(bad).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_profile_and_password_changes() {
        let (service, _) = service();
        let me = service.register(registration("a@example.com")).await.unwrap().user;
        service.register(registration("b@example.com")).await.unwrap();

        let taken = ProfileUpdate {
            email: Some("b@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_profile(&me.id, taken).await,
            Err(AuthError::DuplicateEmail)
        ));

        let rename = ProfileUpdate {
            name: Some("Tunde O.".into()),
            ..Default::default()
        };
        assert_eq!(service.update_profile(&me.id, rename).await.unwrap().name, "Tunde O.");

        assert!(service
            .change_password(&me.id, "wrong-current", "another-password")
            .await
            .is_err());
        service
            .change_password(&me.id, "leafy-greens-42", "another-password")
            .await
            .unwrap();
        assert!(service.login("a@example.com", "another-password").await.is_ok());
        assert!(service.login("a@example.com", "leafy-greens-42").await.is_err());
    }
}
