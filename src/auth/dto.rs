use serde::{Deserialize, Serialize};

use crate::{
    authz::Role,
    error::{ApiError, FieldError},
    users::dto::PublicUser,
};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "name is required"));
        }
        if !super::handlers::is_valid_email(&self.email) {
            errors.push(FieldError::new("email", "email must be valid"));
        }
        if self.password.len() < 6 {
            errors.push(FieldError::new(
                "password",
                "password must be at least 6 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: None,
        }
    }

    #[test]
    fn accepts_a_complete_registration() {
        assert!(request("Ana", "ana@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn rejects_short_password_and_bad_email_together() {
        let err = request("Ana", "not-an-email", "abc").validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_name() {
        let err = request("   ", "ana@example.com", "secret1")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
