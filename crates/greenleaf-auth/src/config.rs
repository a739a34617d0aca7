//! Authentication configuration

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Minimum length of the session signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Which session scheme this deployment runs.
///
/// Chosen once at startup; a process never mixes the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategyKind {
    /// Email/password accounts with server-signed session tokens
    #[default]
    Local,
    /// ID tokens issued by Firebase Authentication
    Federated,
}

impl AuthStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStrategyKind::Local => "local",
            AuthStrategyKind::Federated => "federated",
        }
    }
}

impl std::str::FromStr for AuthStrategyKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "custom" | "jwt" => Ok(AuthStrategyKind::Local),
            "federated" | "firebase" => Ok(AuthStrategyKind::Federated),
            other => Err(AuthError::Config(format!("unknown auth strategy: {}", other))),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub strategy: AuthStrategyKind,

    /// HMAC secret for session tokens (local strategy)
    pub session_secret: String,

    /// Session lifetime in seconds
    pub session_ttl_seconds: u64,

    /// Password-reset token lifetime in seconds
    pub reset_token_ttl_seconds: u64,

    /// Firebase project id (federated strategy)
    pub firebase_project_id: Option<String>,

    /// Base URL of the web app; reset links point at `<public_url>/reset-password`
    pub public_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            strategy: AuthStrategyKind::Local,
            session_secret: String::new(),
            session_ttl_seconds: 7 * 24 * 3600,
            reset_token_ttl_seconds: 3600,
            firebase_project_id: None,
            public_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AuthConfig {
    /// Reject combinations the selected strategy cannot run with
    pub fn validate(&self) -> Result<(), AuthError> {
        match self.strategy {
            AuthStrategyKind::Local => {
                if self.session_secret.len() < MIN_SECRET_LEN {
                    return Err(AuthError::Config(format!(
                        "session secret must be at least {} bytes",
                        MIN_SECRET_LEN
                    )));
                }
            }
            AuthStrategyKind::Federated => {
                if self
                    .firebase_project_id
                    .as_deref()
                    .map_or(true, |p| p.trim().is_empty())
                {
                    return Err(AuthError::Config(
                        "federated auth requires a Firebase project id".into(),
                    ));
                }
            }
        }

        if self.session_ttl_seconds == 0 || self.reset_token_ttl_seconds == 0 {
            return Err(AuthError::Config("token lifetimes must be positive".into()));
        }

        url::Url::parse(&self.public_url)
            .map_err(|e| AuthError::Config(format!("invalid public url: {}", e)))?;

        Ok(())
    }

    /// Page that receives the reset token as a query parameter
    pub fn reset_page_url(&self) -> Result<url::Url, AuthError> {
        let base = url::Url::parse(&self.public_url)
            .map_err(|e| AuthError::Config(format!("invalid public url: {}", e)))?;
        base.join("reset-password")
            .map_err(|e| AuthError::Config(e.to_string()))
    }
}
