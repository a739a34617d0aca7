//! Password-reset token service
//!
//! Issues single-use, one-hour tokens, mails them as a link, and trades a
//! valid token for a password change exactly once. Requests for unknown
//! emails look identical to requests for known ones from the outside.

use std::sync::Arc;

use chrono::{Duration, Utc};
use greenleaf_core::reset::digest_token;
use greenleaf_core::validation::validate_password;
use greenleaf_core::{PasswordResetToken, UserId};
use greenleaf_store::CredentialStore;
use rand::RngCore;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::AuthError;
use crate::mailer::{Mailer, ResetEmail};
use crate::password::PasswordHasher;

/// Random bytes per token (256 bits)
const TOKEN_BYTES: usize = 32;

pub struct PasswordResetService {
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasher,
    ttl: Duration,
    reset_page: Url,
}

impl PasswordResetService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn Mailer>,
        hasher: PasswordHasher,
        ttl_seconds: u64,
        reset_page: Url,
    ) -> Self {
        Self {
            store,
            mailer,
            hasher,
            ttl: Duration::seconds(ttl_seconds as i64),
            reset_page,
        }
    }

    /// Start a reset for `email`.
    ///
    /// Never fails: an unknown address, a store error and a mail error all
    /// produce the same outcome for the caller and are only logged. The mail
    /// is sent from a background task so response time does not depend on
    /// whether the account exists.
    pub async fn request_reset(&self, email: &str) {
        let user = match self.store.find_user_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("Password reset requested for unknown email");
                return;
            }
            Err(e) => {
                error!(error = %e, "Password reset lookup failed");
                return;
            }
        };

        let raw_token = generate_token();
        let record = PasswordResetToken::issue(user.id.clone(), &raw_token, self.ttl);
        if let Err(e) = self.store.create_reset_token(record).await {
            error!(user_id = %user.id, error = %e, "Failed to store reset token");
            return;
        }

        let mut link = self.reset_page.clone();
        link.query_pairs_mut().append_pair("token", &raw_token);

        let message = ResetEmail {
            to: user.email.clone(),
            name: user.name.clone(),
            link,
        };
        let mailer = self.mailer.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            match mailer.send_password_reset(&message).await {
                Ok(()) => info!(user_id = %user_id, "Password reset email sent"),
                Err(e) => warn!(user_id = %user_id, error = %e, "Password reset email failed"),
            }
        });
    }

    /// Check a token without consuming it
    pub async fn verify_token(&self, token: &str) -> Result<(), AuthError> {
        let record = self
            .store
            .find_reset_token(&digest_token(token.trim()))
            .await?
            .ok_or(AuthError::InvalidOrExpired)?;

        if record.is_valid_at(Utc::now()) {
            Ok(())
        } else {
            Err(AuthError::InvalidOrExpired)
        }
    }

    /// Set a new password with a valid token, consuming it
    pub async fn consume_reset(&self, token: &str, new_password: &str) -> Result<UserId, AuthError> {
        self.verify_token(token).await?;
        validate_password(new_password)?;

        let password_hash = self.hasher.hash(new_password).await?;
        let user_id = self
            .store
            .consume_reset_token(&digest_token(token.trim()), &password_hash, Utc::now())
            .await?;

        info!(user_id = %user_id, "Password reset completed");
        Ok(user_id)
    }

    /// Garbage-collect consumed and expired tokens
    pub async fn purge_expired(&self) -> Result<usize, AuthError> {
        let removed = self.store.purge_expired_reset_tokens(Utc::now()).await?;
        info!(removed, "Purged stale password reset tokens");
        Ok(removed)
    }
}

/// 256 random bits, hex encoded
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MailError;
    use greenleaf_core::{NewUser, Role};
    use greenleaf_store::InMemoryCredentialStore;
    use tokio::sync::mpsc;

    struct ChannelMailer(mpsc::UnboundedSender<ResetEmail>);

    #[async_trait::async_trait]
    impl Mailer for ChannelMailer {
        async fn send_password_reset(&self, email: &ResetEmail) -> Result<(), MailError> {
            let _ = self.0.send(email.clone());
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait::async_trait]
    impl Mailer for FailingMailer {
        async fn send_password_reset(&self, _email: &ResetEmail) -> Result<(), MailError> {
            Err(MailError::Transport("connection refused".into()))
        }
    }

    async fn setup(
        mailer: Arc<dyn Mailer>,
    ) -> (PasswordResetService, Arc<InMemoryCredentialStore>, PasswordHasher) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let hasher = PasswordHasher::low_cost();
        store
            .create_user(NewUser {
                id: UserId::new("usr_1"),
                name: "Zainab".into(),
                email: "zainab@example.com".into(),
                password_hash: Some(hasher.hash("original-password").await.unwrap()),
                role: Role::Farmer,
                location: None,
            })
            .await
            .unwrap();

        let service = PasswordResetService::new(
            store.clone(),
            mailer,
            hasher.clone(),
            3600,
            Url::parse("https://greenleaf.example/reset-password").unwrap(),
        );
        (service, store, hasher)
    }

    fn token_from(email: &ResetEmail) -> String {
        email
            .link
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    async fn next_mail(rx: &mut mpsc::UnboundedReceiver<ResetEmail>) -> ResetEmail {
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("reset email was not sent")
            .unwrap()
    }

    #[tokio::test]
    async fn test_reset_round_trip() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (service, store, hasher) = setup(Arc::new(ChannelMailer(tx))).await;

        service.request_reset("ZAINAB@example.com").await;
        let mail = next_mail(&mut rx).await;
        assert_eq!(mail.to, "zainab@example.com");

        let token = token_from(&mail);
        assert_eq!(token.len(), 64);
        service.verify_token(&token).await.unwrap();

        let user_id = service.consume_reset(&token, "brand-new-password").await.unwrap();
        let user = store.find_user_by_id(&user_id).await.unwrap().unwrap();
        assert!(hasher
            .verify("brand-new-password", user.password_hash.as_deref().unwrap())
            .await
            .unwrap());

        // Single use
        assert!(matches!(service.verify_token(&token).await, Err(AuthError::InvalidOrExpired)));
        assert!(matches!(
            service.consume_reset(&token, "another-password").await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_email_creates_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (service, store, _) = setup(Arc::new(ChannelMailer(tx))).await;

        service.request_reset("nobody@example.com").await;

        assert_eq!(store.purge_expired_reset_tokens(Utc::now() + Duration::days(1)).await.unwrap(), 0);
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(100), rx.recv()).await;
        assert!(waited.is_err() || waited.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mail_failure_is_swallowed() {
        let (service, store, _) = setup(Arc::new(FailingMailer)).await;
        service.request_reset("zainab@example.com").await;

        // The token was still recorded
        assert_eq!(store.purge_expired_reset_tokens(Utc::now() + Duration::days(1)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_fails_verification() {
        let (service, store, _) = setup(Arc::new(FailingMailer)).await;

        let mut record = PasswordResetToken::issue(UserId::new("usr_1"), "stale-token", Duration::hours(1));
        record.expires_at = Utc::now() - Duration::minutes(1);
        store.create_reset_token(record).await.unwrap();

        assert!(matches!(
            service.verify_token("stale-token").await,
            Err(AuthError::InvalidOrExpired)
        ));
        assert!(matches!(
            service.consume_reset("stale-token", "brand-new-password").await,
            Err(AuthError::InvalidOrExpired)
        ));
    }

    #[tokio::test]
    async fn test_weak_password_keeps_token() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (service, _, _) = setup(Arc::new(ChannelMailer(tx))).await;

        service.request_reset("zainab@example.com").await;
        let token = token_from(&next_mail(&mut rx).await);

        assert!(matches!(
            service.consume_reset(&token, "short").await,
            Err(AuthError::Validation(_))
        ));
        service.verify_token(&token).await.unwrap();
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }
}
