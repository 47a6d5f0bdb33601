use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

fn valid_phone(phone: &str) -> bool {
    let mut chars = phone.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest_ok = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')');
    (first == '+' || rest_ok(first)) && chars.all(rest_ok)
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if let Some(name) = &self.name {
            if name.is_empty() {
                problems.push("name: Name is required".to_string());
            } else if name.len() > 100 {
                problems.push("name: Name too long".to_string());
            }
        }
        if let Some(phone) = &self.phone {
            if !valid_phone(phone) {
                problems.push("phone: Invalid phone number".to_string());
            } else if phone.len() > 20 {
                problems.push("phone: Phone number too long".to_string());
            }
        }
        if self.address.as_ref().is_some_and(|a| a.len() > 200) {
            problems.push("address: Address too long".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems))
        }
    }
}
