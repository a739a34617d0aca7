//! Per-request authentication and role checks

use std::sync::Arc;

use greenleaf_core::{PublicUser, Role};
use tracing::debug;

use crate::config::AuthStrategyKind;
use crate::error::AuthError;
use crate::strategy::AuthStrategy;

/// Front door for protected routes.
///
/// Wraps the one strategy chosen at startup.
#[derive(Clone)]
pub struct AuthGate {
    strategy: Arc<dyn AuthStrategy>,
}

impl AuthGate {
    pub fn new(strategy: Arc<dyn AuthStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_kind(&self) -> AuthStrategyKind {
        self.strategy.kind()
    }

    /// Identify the caller from the credential the request carried
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<PublicUser, AuthError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        self.strategy.authenticate(credential).await
    }

    /// Check the caller's role against the route's permitted set
    pub fn authorize(&self, user: &PublicUser, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&user.role) {
            Ok(())
        } else {
            debug!(user_id = %user.id, role = %user.role, "Role not permitted");
            Err(AuthError::Forbidden)
        }
    }

    /// `authenticate` then `authorize`
    pub async fn require(
        &self,
        credential: Option<&str>,
        allowed: &[Role],
    ) -> Result<PublicUser, AuthError> {
        let user = self.authenticate(credential).await?;
        self.authorize(&user, allowed)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use greenleaf_core::UserId;

    struct FixedRole(Role);

    #[async_trait::async_trait]
    impl AuthStrategy for FixedRole {
        fn kind(&self) -> AuthStrategyKind {
            AuthStrategyKind::Local
        }

        async fn authenticate(&self, _credential: &str) -> Result<PublicUser, AuthError> {
            Ok(PublicUser {
                id: UserId::new("usr_1"),
                name: "Test".into(),
                email: "t@example.com".into(),
                role: self.0,
                location: None,
                created_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let gate = AuthGate::new(Arc::new(FixedRole(Role::Admin)));
        assert!(matches!(gate.authenticate(None).await, Err(AuthError::MissingCredential)));
        assert!(matches!(gate.authenticate(Some("  ")).await, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_role_gating() {
        let gate = AuthGate::new(Arc::new(FixedRole(Role::Farmer)));

        assert!(gate.require(Some("t"), &[Role::Farmer, Role::Admin]).await.is_ok());
        assert!(matches!(
            gate.require(Some("t"), &[Role::Admin, Role::Researcher]).await,
            Err(AuthError::Forbidden)
        ));
    }
}
