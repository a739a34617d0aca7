//! Session strategies

use std::sync::Arc;

use greenleaf_core::{NewUser, PublicUser, Role, UserId};
use greenleaf_store::{CredentialStore, StoreError};
use tracing::{debug, info, warn};

use crate::config::AuthStrategyKind;
use crate::error::AuthError;
use crate::federated::IdTokenVerifier;
use crate::session::SessionSigner;

/// Resolves a session credential into the caller's identity
#[async_trait::async_trait]
pub trait AuthStrategy: Send + Sync {
    fn kind(&self) -> AuthStrategyKind;

    async fn authenticate(&self, credential: &str) -> Result<PublicUser, AuthError>;
}

/// Server-signed session tokens for locally registered accounts
pub struct LocalStrategy {
    signer: Arc<SessionSigner>,
    store: Arc<dyn CredentialStore>,
}

impl LocalStrategy {
    pub fn new(signer: Arc<SessionSigner>, store: Arc<dyn CredentialStore>) -> Self {
        Self { signer, store }
    }
}

#[async_trait::async_trait]
impl AuthStrategy for LocalStrategy {
    fn kind(&self) -> AuthStrategyKind {
        AuthStrategyKind::Local
    }

    async fn authenticate(&self, credential: &str) -> Result<PublicUser, AuthError> {
        let claims = self.signer.verify(credential)?;

        let user = self
            .store
            .find_user_by_id(&claims.user_id())
            .await?
            .ok_or_else(|| {
                debug!(user_id = %claims.sub, "Session names a user that no longer exists");
                AuthError::UserNotFound
            })?;

        Ok(user.public())
    }
}

/// ID tokens from an external identity provider.
///
/// The first request from a new subject creates its profile with the lowest
/// role; later requests resolve the stored profile.
pub struct FederatedStrategy {
    verifier: Arc<dyn IdTokenVerifier>,
    store: Arc<dyn CredentialStore>,
}

impl FederatedStrategy {
    pub fn new(verifier: Arc<dyn IdTokenVerifier>, store: Arc<dyn CredentialStore>) -> Self {
        Self { verifier, store }
    }
}

#[async_trait::async_trait]
impl AuthStrategy for FederatedStrategy {
    fn kind(&self) -> AuthStrategyKind {
        AuthStrategyKind::Federated
    }

    async fn authenticate(&self, credential: &str) -> Result<PublicUser, AuthError> {
        let claims = self.verifier.verify(credential).await?;
        let user_id = UserId::new(claims.subject.clone());

        if let Some(user) = self.store.find_user_by_id(&user_id).await? {
            return Ok(user.public());
        }

        let fallback_email = format!("{}@users.noreply.greenleaf", claims.subject.to_lowercase());
        let email = claims.email.clone().unwrap_or_else(|| fallback_email.clone());
        let name = claims
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or("user").to_string());

        let profile = NewUser {
            id: user_id,
            name,
            email,
            password_hash: None,
            role: Role::lowest(),
            location: None,
        };

        // An email already owned by another account is never linked; the
        // federated profile gets its own address instead
        let user = match self.store.get_or_create_user(profile.clone()).await {
            Err(StoreError::Duplicate(_)) if profile.email != fallback_email => {
                warn!(
                    user_id = %profile.id,
                    "Federated email belongs to another account, using a no-reply address"
                );
                self.store
                    .get_or_create_user(NewUser {
                        email: fallback_email,
                        ..profile
                    })
                    .await?
            }
            other => other?,
        };

        info!(user_id = %user.id, role = %user.role, "Resolved federated profile");
        Ok(user.public())
    }
}
