use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::Product;

const MAX_PRICE: f64 = 1000.0;
const MAX_LEAD_TIME_HOURS: i32 = 168;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub cost: f64,
    pub category: String,
    pub lead_time_hours: Option<i32>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub category: Option<String>,
    pub lead_time_hours: Option<i32>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

fn check_name(problems: &mut Vec<String>, name: &str) {
    if name.is_empty() {
        problems.push("name: Product name is required".to_string());
    } else if name.len() > 100 {
        problems.push("name: Product name too long".to_string());
    }
}

fn check_description(problems: &mut Vec<String>, description: &str) {
    if description.len() > 500 {
        problems.push("description: Description too long".to_string());
    }
}

fn check_money(problems: &mut Vec<String>, field: &str, value: f64) {
    if value <= 0.0 {
        problems.push(format!(
            "{field}: {} must be positive",
            capitalize(field)
        ));
    } else if value > MAX_PRICE {
        problems.push(format!("{field}: {} too high", capitalize(field)));
    }
}

fn check_category(problems: &mut Vec<String>, category: &str) {
    if category.is_empty() {
        problems.push("category: Category is required".to_string());
    } else if category.len() > 50 {
        problems.push("category: Category too long".to_string());
    }
}

fn check_lead_time(problems: &mut Vec<String>, hours: i32) {
    if hours < 0 {
        problems.push("lead_time_hours: Lead time must be non-negative".to_string());
    } else if hours > MAX_LEAD_TIME_HOURS {
        problems.push("lead_time_hours: Lead time too long".to_string());
    }
}

fn check_image_url(problems: &mut Vec<String>, url: &str) {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        problems.push("image_url: Invalid image URL".to_string());
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        check_name(&mut problems, &self.name);
        if let Some(description) = &self.description {
            check_description(&mut problems, description);
        }
        check_money(&mut problems, "price", self.price);
        check_money(&mut problems, "cost", self.cost);
        check_category(&mut problems, &self.category);
        if let Some(hours) = self.lead_time_hours {
            check_lead_time(&mut problems, hours);
        }
        if let Some(url) = &self.image_url {
            check_image_url(&mut problems, url);
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems))
        }
    }
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if let Some(name) = &self.name {
            check_name(&mut problems, name);
        }
        if let Some(description) = &self.description {
            check_description(&mut problems, description);
        }
        if let Some(price) = self.price {
            check_money(&mut problems, "price", price);
        }
        if let Some(cost) = self.cost {
            check_money(&mut problems, "cost", cost);
        }
        if let Some(category) = &self.category {
            check_category(&mut problems, category);
        }
        if let Some(hours) = self.lead_time_hours {
            check_lead_time(&mut problems, hours);
        }
        if let Some(url) = &self.image_url {
            check_image_url(&mut problems, url);
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> CreateProductRequest {
        CreateProductRequest {
            name: "Sandwich Loaf".into(),
            description: None,
            price: 11.0,
            cost: 3.85,
            category: "Sandwich Breads".into(),
            lead_time_hours: Some(48),
            image_url: None,
            available: None,
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn price_and_cost_must_be_positive_and_capped() {
        let mut request = valid_create();
        request.price = 0.0;
        request.cost = 1500.0;
        match request.validate() {
            Err(AppError::Validation(problems)) => {
                assert!(problems.iter().any(|p| p == "price: Price must be positive"));
                assert!(problems.iter().any(|p| p == "cost: Cost too high"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn lead_time_is_capped_at_one_week() {
        let mut request = valid_create();
        request.lead_time_hours = Some(169);
        assert!(request.validate().is_err());
        request.lead_time_hours = Some(168);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let request = UpdateProductRequest {
            available: Some(false),
            ..Default::default()
        };
        assert!(request.validate().is_ok());

        let request = UpdateProductRequest {
            image_url: Some("not-a-url".into()),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
