//! Salted one-way password hashing (Argon2id)

use std::sync::{Arc, OnceLock};

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier, Version};

use crate::error::AuthError;

/// Argon2id hasher with an optional server-side pepper.
///
/// Cheap to clone; the parameters and the timing-equalisation hash are shared.
#[derive(Clone)]
pub struct PasswordHasher {
    inner: Arc<Inner>,
}

struct Inner {
    pepper: Vec<u8>,
    params: Params,
    /// Hash verified against when a login names an unknown account
    dummy_hash: OnceLock<String>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Vec::new(), Params::default())
    }
}

impl PasswordHasher {
    pub fn new(pepper: impl Into<Vec<u8>>, params: Params) -> Self {
        Self {
            inner: Arc::new(Inner {
                pepper: pepper.into(),
                params,
                dummy_hash: OnceLock::new(),
            }),
        }
    }

    /// Minimal-cost parameters, for tests and local tooling only
    pub fn low_cost() -> Self {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap_or_default();
        Self::new(Vec::new(), params)
    }

    fn argon2(&self) -> Result<Argon2<'_>, AuthError> {
        let argon2 = if self.inner.pepper.is_empty() {
            Argon2::new(Algorithm::Argon2id, Version::V0x13, self.inner.params.clone())
        } else {
            Argon2::new_with_secret(
                &self.inner.pepper,
                Algorithm::Argon2id,
                Version::V0x13,
                self.inner.params.clone(),
            )
            .map_err(|e| AuthError::Hashing(e.to_string()))?
        };
        Ok(argon2)
    }

    fn hash_now(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify_now(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        match self.argon2()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }

    /// Run Argon2 work on the blocking pool so request tasks keep moving
    async fn blocking<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(PasswordHasher) -> Result<T, AuthError> + Send + 'static,
    {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || work(hasher))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    /// Hash a password into a PHC string
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        self.blocking(move |hasher| hasher.hash_now(&password)).await
    }

    /// Check a password against a stored PHC string
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        self.blocking(move |hasher| hasher.verify_now(&password, &stored_hash))
            .await
    }

    /// Spend the same work as a real verification, then fail.
    ///
    /// Used when the account does not exist so response times do not reveal it.
    pub async fn verify_dummy(&self, password: &str) {
        let password = password.to_owned();
        let _ = self
            .blocking(move |hasher| {
                let dummy = match hasher.inner.dummy_hash.get() {
                    Some(hash) => hash.clone(),
                    None => {
                        let hash = hasher.hash_now("greenleaf-dummy-password")?;
                        hasher.inner.dummy_hash.get_or_init(|| hash).clone()
                    }
                };
                hasher.verify_now(&password, &dummy)
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::low_cost();
        let hash = hasher.hash("correct horse").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(hasher.verify("correct horse", &hash).await.unwrap());
        assert!(!hasher.verify("wrong horse", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_salts_differ() {
        let hasher = PasswordHasher::low_cost();
        assert_ne!(
            hasher.hash("same").await.unwrap(),
            hasher.hash("same").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_pepper_is_required_to_verify() {
        let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
        let peppered = PasswordHasher::new(b"server-pepper".to_vec(), params.clone());
        let plain = PasswordHasher::new(Vec::new(), params);

        let hash = peppered.hash("secret-password").await.unwrap();
        assert!(peppered.verify("secret-password", &hash).await.unwrap());
        assert!(!plain.verify("secret-password", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let hasher = PasswordHasher::low_cost();
        assert!(hasher.verify("pw", "not-a-phc-string").await.is_err());
    }

    #[tokio::test]
    async fn test_dummy_verification_caches_its_hash() {
        let hasher = PasswordHasher::low_cost();
        hasher.verify_dummy("anything").await;
        let first = hasher.inner.dummy_hash.get().cloned().unwrap();
        hasher.verify_dummy("something else").await;
        assert_eq!(hasher.inner.dummy_hash.get(), Some(&first));
    }
}
