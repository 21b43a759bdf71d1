use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use validator::Validate;

use crate::validation::rules::{
    email_present, known_role, name_present, normalize_email, NAME_REGEX,
};
use crate::validation::Form;

/// Role of a user account.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account, sees only its own todos.
    #[default]
    User,
    /// Administrator, may use the `/admin` endpoints.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account as returned by the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user together with the stored password hash, used only by the login flow.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Data required to create a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Builds the stored user. `id` and timestamps are assigned here.
    pub fn into_credentials(self) -> Credentials {
        let now = Utc::now();
        Credentials {
            user: User {
                id: Uuid::new_v4(),
                name: self.name,
                email: self.email,
                role: self.role,
                created_at: now,
                updated_at: now,
            },
            password_hash: self.password_hash,
        }
    }
}

/// Partial update of a user; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
    }
}

/// Body of `PUT /admin/users/{id}`. Passwords cannot be changed here.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUserUpdateRequest {
    #[serde(default)]
    #[validate(
        custom = "name_present",
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        regex(path = "NAME_REGEX", message = "Name can only contain letters and spaces")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "email_present", email(message = "Invalid email format"))]
    pub email: String,
    /// `user` or `admin`; absent keeps the current role.
    #[validate(custom = "known_role")]
    pub role: Option<String>,
}

impl Form for AdminUserUpdateRequest {
    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }
}

impl From<AdminUserUpdateRequest> for UserChanges {
    fn from(request: AdminUserUpdateRequest) -> Self {
        UserChanges {
            name: Some(request.name),
            email: Some(request.email),
            role: request.role.as_deref().and_then(|role| role.parse().ok()),
        }
    }
}
