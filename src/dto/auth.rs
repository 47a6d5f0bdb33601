use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if !self.email.contains('@') || self.email.len() > 255 {
            problems.push("email: Invalid email address".to_string());
        }
        if self.password.len() < 8 {
            problems.push("password: Password must be at least 8 characters".to_string());
        }
        if self.name.as_ref().is_some_and(|n| n.len() > 100) {
            problems.push("name: Name too long".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems))
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_and_bad_email_are_both_reported() {
        let request = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            name: None,
        };
        match request.validate() {
            Err(AppError::Validation(problems)) => assert_eq!(problems.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
