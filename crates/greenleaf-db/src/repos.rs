//! Repository implementations for database operations

use chrono::{DateTime, Utc};
use greenleaf_core::user::normalize_email;
use greenleaf_core::{NewUser, PasswordResetToken, ProfileUpdate, User};
use sqlx::PgPool;

use crate::models::*;
use crate::{DbError, Result};

/// Map unique-constraint violations on the users table to `Duplicate`
fn user_write_error(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("users_email_key") => return DbError::Duplicate("email already registered".into()),
            Some("users_pkey") => return DbError::Duplicate("user id already exists".into()),
            _ => {}
        }
    }
    DbError::Query(e)
}

/// Repository for users
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user.id.as_str())
        .bind(user.name.trim())
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.location.map(|l| l.latitude))
        .bind(user.location.map(|l| l.longitude))
        .fetch_one(&self.pool)
        .await
        .map_err(user_write_error)?;

        row.try_into()
    }

    /// Insert unless a row with the same id exists, then return the stored row
    pub async fn create_if_absent(&self, user: NewUser) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user.id.as_str())
        .bind(user.name.trim())
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.location.map(|l| l.latitude))
        .bind(user.location.map(|l| l.longitude))
        .execute(&self.pool)
        .await
        .map_err(user_write_error)?;

        self.find_by_id(user.id.as_str())
            .await?
            .ok_or_else(|| DbError::NotFound(user.id.to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                latitude = COALESCE($4, latitude),
                longitude = COALESCE($5, longitude),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.email.as_deref().map(normalize_email))
        .bind(update.location.map(|l| l.latitude))
        .bind(update.location.map(|l| l.longitude))
        .fetch_optional(&self.pool)
        .await
        .map_err(user_write_error)?
        .ok_or_else(|| DbError::NotFound(id.to_string()))?;

        row.try_into()
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Repository for password-reset tokens
pub struct ResetTokenRepo {
    pool: PgPool,
}

impl ResetTokenRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, token: &PasswordResetToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&token.id.0)
        .bind(token.user_id.as_str())
        .bind(&token.token_hash)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("password_reset_tokens_user_id_fkey") {
                    return DbError::NotFound(token.user_id.to_string());
                }
            }
            DbError::Query(e)
        })?;

        Ok(())
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> Result<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Flip `used` and write the new password hash in one transaction.
    ///
    /// The conditional update is the compare-and-swap: concurrent callers
    /// serialise on the token row and only the first sees `used = false`.
    /// Returns the owner's id, or `None` when the token is not usable.
    pub async fn consume(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE token_hash = $1 AND used = FALSE AND expires_at > $2
            RETURNING user_id
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(&user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(user_id))
    }

    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM password_reset_tokens WHERE used = TRUE OR expires_at <= $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM password_reset_tokens")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
