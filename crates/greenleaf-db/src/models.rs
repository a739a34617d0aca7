//! Database models for Green Leaf

use chrono::{DateTime, Utc};
use greenleaf_core::{GeoLocation, PasswordResetToken, User, UserId};
use greenleaf_core::reset::ResetTokenId;
use sqlx::FromRow;

use crate::DbError;

/// Row of the `users` table
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e: String| DbError::Corrupt(format!("user {}: {}", row.id, e)))?;

        let location = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoLocation {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(User {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            location,
            created_at: row.created_at,
        })
    }
}

/// Row of the `password_reset_tokens` table
#[derive(Debug, Clone, FromRow)]
pub struct ResetTokenRow {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for PasswordResetToken {
    fn from(row: ResetTokenRow) -> Self {
        PasswordResetToken {
            id: ResetTokenId(row.id),
            user_id: UserId::new(row.user_id),
            token_hash: row.token_hash,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenleaf_core::Role;

    fn row(role: &str, latitude: Option<f64>, longitude: Option<f64>) -> UserRow {
        UserRow {
            id: "usr_1".into(),
            name: "Amaka".into(),
            email: "amaka@farm.example".into(),
            password_hash: None,
            role: role.into(),
            latitude,
            longitude,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_row_conversion() {
        let user = User::try_from(row("researcher", Some(9.0), Some(7.4))).unwrap();
        assert_eq!(user.role, Role::Researcher);
        assert_eq!(user.location.unwrap().latitude, 9.0);
    }

    #[test]
    fn test_half_location_is_dropped() {
        let user = User::try_from(row("farmer", Some(9.0), None)).unwrap();
        assert!(user.location.is_none());
    }

    #[test]
    fn test_unknown_role_is_corrupt() {
        let err = User::try_from(row("overlord", None, None)).unwrap_err();
        assert!(matches!(err, DbError::Corrupt(_)));
    }
}
