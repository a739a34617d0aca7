//! Connection pool for the credential database

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::repos::{ResetTokenRepo, UserRepo};
use crate::{DbError, Result};

/// How to reach PostgreSQL; built from the server configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a request may wait for a free connection
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            url: url.into(),
            max_connections: max_connections.max(1),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Row counts and pool occupancy, as shown by `greenleaf db status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStatus {
    pub users: i64,
    pub reset_tokens: i64,
    pub connections: u32,
    pub idle_connections: usize,
}

/// Shared handle to the users and reset-token tables
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        info!(max_connections = config.max_connections, "Connected to credential database");
        Ok(Self { pool })
    }

    /// Apply the embedded migrations for the users and reset-token tables
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Credential database schema is up to date");
        Ok(())
    }

    pub fn users(&self) -> UserRepo {
        UserRepo::new(self.pool.clone())
    }

    pub fn reset_tokens(&self) -> ResetTokenRepo {
        ResetTokenRepo::new(self.pool.clone())
    }

    /// Fails when the tables are missing or the server is unreachable
    pub async fn status(&self) -> Result<DatabaseStatus> {
        Ok(DatabaseStatus {
            users: self.users().count().await?,
            reset_tokens: self.reset_tokens().count().await?,
            connections: self.pool.size(),
            idle_connections: self.pool.num_idle(),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
