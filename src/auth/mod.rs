pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Role, User};
use crate::validation::rules::{
    email_present, letters_and_digits, name_present, normalize_email, password_present,
    NAME_REGEX,
};
use crate::validation::Form;

// Re-export necessary items
pub use extractors::Identity;
pub use middleware::{authenticate, authorize, AuthGate, RoleGate};
pub use password::PasswordHasher;
pub use token::{Claims, TokenError, TokenService};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Lower-cased once accepted.
    #[serde(default)]
    #[validate(custom = "email_present", email(message = "Invalid email format"))]
    pub email: String,
    /// Only checked for presence; no strength rules on login.
    #[serde(default)]
    #[validate(custom = "password_present")]
    pub password: String,
}

impl Form for LoginRequest {
    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }
}

/// Represents the payload for a new user registration request.
///
/// Any `role` sent by the client is ignored; new accounts are always `user`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 2 to 50 letters and spaces.
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
    /// At least 6 letters and digits, with at least one of each.
    #[serde(default)]
    #[validate(
        custom = "password_present",
        length(min = 6, message = "Password must be at least 6 characters"),
        custom = "letters_and_digits"
    )]
    pub password: String,
}

impl Form for RegisterRequest {
    fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }
}

fn name_or_email(form: &ProfileUpdateRequest) -> Result<(), ValidationError> {
    if form.name.is_none() && form.email.is_none() {
        let mut error = ValidationError::new("name_or_email");
        error.message = Some("At least one valid field (name or email) must be provided".into());
        return Err(error);
    }
    Ok(())
}

/// Represents the payload of `PUT /users/profile`. At least one field is required;
/// `null` counts as absent.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "name_or_email", skip_on_field_errors = false))]
pub struct ProfileUpdateRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        regex(path = "NAME_REGEX", message = "Name can only contain letters and spaces")
    )]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl Form for ProfileUpdateRequest {
    fn normalize(&mut self) {
        if let Some(email) = &self.email {
            self.email = Some(normalize_email(email));
        }
    }
}

/// Response data after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// The JWT for bearer authentication.
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{check, Report};
    use serde_json::{json, Value};

    fn report_for<T: Form>(payload: Value) -> Report {
        check(&serde_json::from_value::<T>(payload).unwrap())
    }

    #[test]
    fn test_login_request_validation() {
        assert!(report_for::<LoginRequest>(json!({ "email": "test@example.com", "password": "x" })).is_empty());
        assert!(!report_for::<LoginRequest>(json!({ "email": "testexample.com", "password": "x" })).is_empty());
        assert!(!report_for::<LoginRequest>(json!({ "email": "test@example.com" })).is_empty());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = json!({ "name": "Jo Doe", "email": "a@b.com", "password": "abc123" });
        assert!(report_for::<RegisterRequest>(valid).is_empty());

        let report = report_for::<RegisterRequest>(json!({ "name": "J", "email": "a@b.com", "password": "abc123" }));
        assert_eq!(
            report.messages("name"),
            &["Name must be between 2 and 50 characters".to_string()]
        );
    }

    #[test]
    fn test_auth_response_shape() {
        let json = serde_json::to_value(AuthResponse {
            id: Uuid::nil(),
            name: "Jo Doe".into(),
            email: "a@b.com".into(),
            role: Role::User,
            token: "t".into(),
        })
        .unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["token"], "t");
    }
}
