//! Green Leaf Database
//!
//! PostgreSQL persistence layer for Green Leaf.
//!
//! This crate provides:
//! - Row models for users and password-reset tokens
//! - Repositories over a shared `PgPool`, with a status summary
//! - `PgCredentialStore`, the production `CredentialStore`
//! - Migration support via SQLx

pub mod models;
pub mod pool;
pub mod repos;
pub mod store;

pub use models::*;
pub use pool::{DatabaseConfig, DatabasePool, DatabaseStatus};
pub use repos::*;
pub use store::PgCredentialStore;

use greenleaf_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => StoreError::NotFound(what),
            DbError::Duplicate(what) => StoreError::Duplicate(what),
            other => StoreError::Storage(other.to_string()),
        }
    }
}
