//! Federated identity: Firebase ID token verification

use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AuthError;

/// Google's published signing keys for Firebase ID tokens
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Used when the key endpoint sends no `Cache-Control: max-age`
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);

/// Identity asserted by the external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedClaims {
    /// Provider subject id, stable per account
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Verifies bearer tokens issued by an external identity provider
#[async_trait::async_trait]
pub trait IdTokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<FederatedClaims, AuthError>;
}

#[derive(Debug, Deserialize)]
struct FirebaseIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

struct CachedKeys {
    keys: JwkSet,
    expires_at: Instant,
}

/// Firebase Authentication ID token verifier.
///
/// Checks the RS256 signature against Google's JWK set, then `aud`, `iss`
/// and `exp`. Keys are cached for as long as the endpoint allows.
pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_jwks_url(project_id, FIREBASE_JWKS_URL)
    }

    pub fn with_jwks_url(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            cache: RwLock::new(None),
        }
    }

    /// Expected `iss` claim
    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        debug!(url = %self.jwks_url, "Fetching identity provider signing keys");

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let ttl = max_age(response.headers()).unwrap_or(DEFAULT_KEY_TTL);
        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed key set: {}", e)))?;

        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        // Expired, empty, or the provider rotated keys since the last fetch
        let fresh = self.fetch_keys().await?;
        let jwk = fresh.keys.find(kid).cloned();
        *self.cache.write().await = Some(fresh);

        jwk.ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key {}", kid)))
    }
}

#[async_trait::async_trait]
impl IdTokenVerifier for FirebaseVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedClaims, AuthError> {
        let header = decode_header(id_token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing key id".into()))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::Provider(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);

        let claims = decode::<FirebaseIdClaims>(id_token, &key, &validation)
            .map_err(|e| {
                warn!(error = %e, "Rejected identity provider token");
                AuthError::InvalidToken(e.to_string())
            })?
            .claims;

        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()));
        }

        Ok(FederatedClaims {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
        })
    }
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .find_map(|directive| directive.trim().strip_prefix("max-age=")?.parse().ok())
        .map(Duration::from_secs)
}
