//! Application state

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use greenleaf_auth::{
    AccountService, AuthGate, AuthStrategy, AuthStrategyKind, FederatedStrategy, FirebaseVerifier,
    IdTokenVerifier, LocalStrategy, LogMailer, Mailer, PasswordHasher, PasswordResetService,
    SessionSigner, SmtpMailer,
};
use greenleaf_core::UserId;
use greenleaf_db::{DatabasePool, PgCredentialStore};
use greenleaf_store::{CredentialStore, InMemoryCredentialStore};
use greenleaf_upload::{UploadLedger, Uploader};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{ConfigError, ServerConfig};

/// Collaborators the state is assembled from
pub struct Services {
    pub store: Arc<dyn CredentialStore>,
    pub mailer: Arc<dyn Mailer>,
    pub hasher: PasswordHasher,
    pub uploader: Uploader,
    /// Overrides the Firebase verifier under the federated strategy
    pub verifier: Option<Arc<dyn IdTokenVerifier>>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,

    pub gate: AuthGate,
    pub accounts: Arc<AccountService>,
    pub resets: Arc<PasswordResetService>,
    pub uploader: Arc<Uploader>,

    /// Per-user upload history, in memory only
    pub ledgers: Arc<RwLock<HashMap<UserId, UploadLedger>>>,

    /// Database pool, when running against PostgreSQL
    pub db: Option<DatabasePool>,
}

impl AppState {
    /// Wire everything from configuration: database or in-memory store,
    /// SMTP or log mailer, providers from their credentials
    pub async fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let (store, db): (Arc<dyn CredentialStore>, Option<DatabasePool>) =
            match config.database_config() {
                Some(db_config) => {
                    let pool = DatabasePool::connect(&db_config)
                        .await
                        .context("connecting to database")?;
                    pool.migrate().await.context("running migrations")?;
                    (Arc::new(PgCredentialStore::new(&pool)), Some(pool))
                }
                None => {
                    warn!("No database configured, using in-memory credential store");
                    (Arc::new(InMemoryCredentialStore::new()), None)
                }
            };

        let mailer: Arc<dyn Mailer> = match &config.smtp_host {
            Some(host) => Arc::new(
                SmtpMailer::new(
                    host,
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                    config.mail_from.clone(),
                )
                .context("configuring SMTP")?,
            ),
            None => {
                info!("No SMTP host configured, reset links will only be logged");
                Arc::new(LogMailer)
            }
        };

        let hasher = match config.password_pepper.as_deref() {
            Some(pepper) if !pepper.is_empty() => {
                PasswordHasher::new(pepper.as_bytes().to_vec(), Default::default())
            }
            _ => PasswordHasher::default(),
        };

        let uploader = config
            .upload_config()
            .build_uploader()
            .context("building upload providers")?;

        let mut state = Self::from_services(
            config,
            Services {
                store,
                mailer,
                hasher,
                uploader,
                verifier: None,
            },
        )?;
        state.db = db;
        Ok(state)
    }

    pub fn from_services(config: ServerConfig, services: Services) -> Result<Self, ConfigError> {
        let auth = config.auth_config()?;
        let reset_page = auth
            .reset_page_url()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let signer = Arc::new(SessionSigner::new(
            auth.session_secret.as_bytes(),
            auth.session_ttl_seconds,
        ));

        let strategy: Arc<dyn AuthStrategy> = match auth.strategy {
            AuthStrategyKind::Local => {
                Arc::new(LocalStrategy::new(signer.clone(), services.store.clone()))
            }
            AuthStrategyKind::Federated => {
                let verifier = match services.verifier {
                    Some(verifier) => verifier,
                    None => {
                        let project = auth.firebase_project_id.clone().ok_or_else(|| {
                            ConfigError::Invalid("firebase_project_id is required".into())
                        })?;
                        Arc::new(FirebaseVerifier::new(project)) as Arc<dyn IdTokenVerifier>
                    }
                };
                Arc::new(FederatedStrategy::new(verifier, services.store.clone()))
            }
        };
        info!(strategy = auth.strategy.as_str(), "Authentication strategy selected");

        let accounts = AccountService::new(services.store.clone(), services.hasher.clone(), signer);
        let resets = PasswordResetService::new(
            services.store,
            services.mailer,
            services.hasher,
            auth.reset_token_ttl_seconds,
            reset_page,
        );

        Ok(Self {
            config: Arc::new(config),
            gate: AuthGate::new(strategy),
            accounts: Arc::new(accounts),
            resets: Arc::new(resets),
            uploader: Arc::new(services.uploader),
            ledgers: Arc::new(RwLock::new(HashMap::new())),
            db: None,
        })
    }
}
