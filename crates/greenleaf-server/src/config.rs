//! Server configuration
//!
//! Built once at startup from defaults, an optional `greenleaf.toml` and
//! `GREENLEAF_*` environment variables, then passed down explicitly.

use std::path::{Path, PathBuf};

use greenleaf_auth::{AuthConfig, AuthStrategyKind};
use greenleaf_db::DatabaseConfig;
use greenleaf_upload::UploadConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECONDS_PER_DAY: u64 = 24 * 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,

    /// Externally visible base URL; reset links and temporary uploads hang off it
    pub public_url: String,

    /// Comma-separated allowed origins, `*` for any
    pub cors_origins: String,

    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,

    /// `local` or `federated`
    pub auth_strategy: String,
    pub jwt_secret: String,
    pub session_ttl_days: u64,
    pub reset_token_ttl_secs: u64,
    pub firebase_project_id: Option<String>,
    pub password_pepper: Option<String>,

    pub imgur_client_id: Option<String>,
    pub imgbb_api_key: Option<String>,
    pub temp_upload_dir: Option<PathBuf>,
    pub max_upload_mb: u64,
    pub allowed_mime_prefix: String,
    pub provider_timeout_secs: u64,

    /// Absent means the in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,

    /// Absent means reset links are only logged
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            public_url: "http://localhost:3000".to_string(),
            cors_origins: "*".to_string(),
            secure_cookies: true,
            auth_strategy: "local".to_string(),
            jwt_secret: String::new(),
            session_ttl_days: 7,
            reset_token_ttl_secs: 3600,
            firebase_project_id: None,
            password_pepper: None,
            imgur_client_id: None,
            imgbb_api_key: None,
            temp_upload_dir: None,
            max_upload_mb: 10,
            allowed_mime_prefix: "image/".to_string(),
            provider_timeout_secs: 10,
            database_url: None,
            db_max_connections: 10,
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            mail_from: "Green Leaf <noreply@greenleaf.local>".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from `greenleaf.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("greenleaf").required(false),
        };

        let config: ServerConfig = config::Config::builder()
            .add_source(file_source)
            .add_source(config::Environment::with_prefix("GREENLEAF").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn strategy(&self) -> Result<AuthStrategyKind, ConfigError> {
        self.auth_strategy
            .parse()
            .map_err(|e: greenleaf_auth::AuthError| ConfigError::Invalid(e.to_string()))
    }

    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        Ok(AuthConfig {
            strategy: self.strategy()?,
            session_secret: self.jwt_secret.clone(),
            session_ttl_seconds: self.session_ttl_days * SECONDS_PER_DAY,
            reset_token_ttl_seconds: self.reset_token_ttl_secs,
            firebase_project_id: self.firebase_project_id.clone(),
            public_url: self.public_url.clone(),
        })
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            imgur_client_id: self.imgur_client_id.clone(),
            imgbb_api_key: self.imgbb_api_key.clone(),
            temp_upload_dir: self.temp_upload_dir.clone(),
            public_url: self.public_url.clone(),
            max_upload_mb: self.max_upload_mb,
            allowed_mime_prefix: self.allowed_mime_prefix.clone(),
            provider_timeout_secs: self.provider_timeout_secs,
        }
    }

    /// `None` when the server runs on the in-memory store
    pub fn database_config(&self) -> Option<DatabaseConfig> {
        self.database_url
            .as_ref()
            .map(|url| DatabaseConfig::new(url.clone(), self.db_max_connections))
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize) * 1024 * 1024
    }

    /// Reject combinations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth_config()?
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.max_upload_mb == 0 {
            return Err(ConfigError::Invalid("max_upload_mb must be positive".into()));
        }
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider_timeout_secs must be positive".into()));
        }
        if self.smtp_host.is_some() && self.mail_from.trim().is_empty() {
            return Err(ConfigError::Invalid("mail_from is required with smtp_host".into()));
        }

        Ok(())
    }

    /// Effective configuration with secrets masked, for display
    pub fn redacted(&self) -> Self {
        fn mask(value: &Option<String>) -> Option<String> {
            value.as_ref().map(|_| "********".to_string())
        }

        Self {
            jwt_secret: if self.jwt_secret.is_empty() {
                String::new()
            } else {
                "********".to_string()
            },
            password_pepper: mask(&self.password_pepper),
            imgur_client_id: mask(&self.imgur_client_id),
            imgbb_api_key: mask(&self.imgbb_api_key),
            smtp_password: mask(&self.smtp_password),
            database_url: mask(&self.database_url),
            ..self.clone()
        }
    }
}
