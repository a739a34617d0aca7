//! User identity records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user.
///
/// Locally registered users get a generated id; users coming from the
/// federated identity provider are keyed by the provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("usr_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Researcher,
    Farmer,
}

impl Role {
    /// Role given to accounts nobody has promoted yet
    pub fn lowest() -> Self {
        Role::Farmer
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Researcher => "researcher",
            Role::Farmer => "farmer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "researcher" => Ok(Role::Researcher),
            "farmer" => Ok(Role::Farmer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Where a farm or field is located
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A stored user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,

    /// Always stored lower-cased
    pub email: String,

    /// Argon2 PHC string. `None` for accounts managed by the federated
    /// identity provider.
    pub password_hash: Option<String>,

    pub role: Role,
    pub location: Option<GeoLocation>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// View of this user that is safe to hand to clients
    pub fn public(&self) -> PublicUser {
        PublicUser::from(self)
    }
}

/// A user without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            location: user.location,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub location: Option<GeoLocation>,
}

impl NewUser {
    /// Build the stored record, normalising the email
    pub fn into_user(self, created_at: DateTime<Utc>) -> User {
        User {
            id: self.id,
            name: self.name,
            email: normalize_email(&self.email),
            password_hash: self.password_hash,
            role: self.role,
            location: self.location,
            created_at,
        }
    }
}

/// Partial profile edit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<GeoLocation>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.location.is_none()
    }

    /// Apply the edit to a record in place
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            user.email = normalize_email(email);
        }
        if let Some(location) = self.location {
            user.location = Some(location);
        }
    }
}

/// Emails are unique case-insensitively; store and compare them lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        NewUser {
            id: UserId::new("usr_1"),
            name: "Ada".into(),
            email: "  Ada@Farm.Example ".into(),
            password_hash: Some("$argon2id$secret".into()),
            role: Role::Researcher,
            location: None,
        }
        .into_user(Utc::now())
    }

    #[test]
    fn test_email_is_normalized_on_create() {
        assert_eq!(sample_user().email, "ada@farm.example");
    }

    #[test]
    fn test_public_user_hides_password_hash() {
        let json = serde_json::to_value(sample_user().public()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "researcher");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("farmer".parse::<Role>().unwrap(), Role::Farmer);
        assert!("gardener".parse::<Role>().is_err());
        assert_eq!(Role::lowest(), Role::Farmer);
    }

    #[test]
    fn test_profile_update_applies_fields() {
        let mut user = sample_user();
        let update = ProfileUpdate {
            name: Some(" Ada L. ".into()),
            email: Some("ADA@new.example".into()),
            location: Some(GeoLocation {
                latitude: 6.5,
                longitude: 3.4,
            }),
        };
        update.apply_to(&mut user);

        assert_eq!(user.name, "Ada L.");
        assert_eq!(user.email, "ada@new.example");
        assert!(user.location.unwrap().is_valid());
    }
}
