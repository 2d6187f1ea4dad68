//! Identity model - registered principals of the directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Closed set of roles. Stored as `USER_ROLE` / `ADMIN_ROLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[default]
    #[serde(rename = "USER_ROLE")]
    User,
    #[serde(rename = "ADMIN_ROLE")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER_ROLE",
            Role::Admin => "ADMIN_ROLE",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user of the directory, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. `None` for identities created through Google sign-in.
    #[serde(default)]
    pub password: Option<String>,
    /// Avatar: an uploaded filename or a provider picture URL.
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Set once the identity has signed in through Google.
    #[serde(default)]
    pub google: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Identity registered with email and password.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: Some(password_hash),
            img: None,
            role: Role::User,
            google: false,
            created_at: Utc::now(),
        }
    }

    /// Identity created on first Google sign-in; it has no local password.
    pub fn new_federated(name: String, email: String, picture: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: None,
            img: picture,
            role: Role::User,
            google: true,
            created_at: Utc::now(),
        }
    }

    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser::from(self.clone())
    }
}

/// User as returned by the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SanitizedUser {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub img: Option<String>,
    pub role: Role,
    pub google: bool,
}

impl From<User> for SanitizedUser {
    fn from(u: User) -> Self {
        Self {
            uid: u.id,
            name: u.name,
            email: u.email,
            img: u.img,
            role: u.role,
            google: u.google,
        }
    }
}

/// Fields a profile update may change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub img: Option<String>,
    pub google: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.img.is_none()
            && self.google.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(img) = &self.img {
            user.img = Some(img.clone());
        }
        if let Some(google) = self.google {
            user.google = google;
        }
    }
}
