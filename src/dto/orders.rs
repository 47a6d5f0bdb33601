use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Order, OrderItem, Product};
use crate::status::{OrderStatus, PaymentStatus};

pub const MAX_ITEM_QUANTITY: i32 = 100;
const MAX_ORDER_AMOUNT: f64 = 10_000.0;

/// The product as the cart saw it; price and cost are trusted snapshots, not
/// re-read from the current product row.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub price: f64,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product: ProductSnapshot,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub status: Option<OrderStatus>,
    pub pickup_date: String,
    pub delivery_method: String,
    pub notes: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItemInput>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        if self.pickup_date.is_empty() {
            problems.push("pickup_date: Pickup date is required".to_string());
        } else if normalize_pickup_date(&self.pickup_date).is_err() {
            problems.push("pickup_date: Invalid pickup date format".to_string());
        }

        if self.delivery_method != "pickup" && self.delivery_method != "delivery" {
            problems.push("delivery_method: Must be pickup or delivery".to_string());
        }

        if self.notes.as_ref().is_some_and(|n| n.len() > 500) {
            problems.push("notes: Notes too long".to_string());
        }

        if self.items.is_empty() {
            problems.push("items: Order must contain at least one item".to_string());
        }
        for item in &self.items {
            if item.quantity <= 0 {
                problems.push("items.quantity: Quantity must be positive".to_string());
            } else if item.quantity > MAX_ITEM_QUANTITY {
                problems.push("items.quantity: Quantity too high".to_string());
            }
            if item.product.price <= 0.0 {
                problems.push("items.product.price: Product price must be positive".to_string());
            }
        }

        let (total, cost, _) = self.totals();
        if total > MAX_ORDER_AMOUNT {
            problems.push("total: Total too high".to_string());
        }
        if cost > MAX_ORDER_AMOUNT {
            problems.push("cost: Cost too high".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(problems))
        }
    }

    /// Total, cost, and profit, all snapshotted at placement time from the
    /// client-supplied product data. Profit never recomputes when product
    /// prices change later.
    pub fn totals(&self) -> (f64, f64, f64) {
        let total: f64 = self
            .items
            .iter()
            .map(|i| i.product.price * f64::from(i.quantity))
            .sum();
        let cost: f64 = self
            .items
            .iter()
            .map(|i| i.product.cost.unwrap_or(0.0) * f64::from(i.quantity))
            .sum();
        (total, cost, total - cost)
    }
}

/// Accepts both date-only (`YYYY-MM-DD`) and datetime strings; a bare date is
/// widened to midnight UTC before it reaches the database.
pub fn normalize_pickup_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    Err(format!("invalid pickup date: {raw}"))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl UpdateOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.status.is_none() && self.payment_status.is_none() {
            return Err(AppError::Validation(vec![
                "status or payment_status is required".to_string(),
            ]));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub user_id: Option<Uuid>,
    pub admin: Option<bool>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemWithProduct {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItemWithProduct>,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<OrderWithItems>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, cost: f64, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product: ProductSnapshot {
                id: Uuid::new_v4(),
                price,
                cost: Some(cost),
            },
            quantity,
        }
    }

    fn valid_request() -> CreateOrderRequest {
        CreateOrderRequest {
            user_id: Uuid::new_v4(),
            status: None,
            pickup_date: "2026-09-01".into(),
            delivery_method: "pickup".into(),
            notes: None,
            customer_name: None,
            customer_phone: None,
            items: vec![item(16.0, 4.0, 2)],
        }
    }

    #[test]
    fn totals_snapshot_price_times_quantity() {
        let request = valid_request();
        let (total, cost, profit) = request.totals();
        assert_eq!(total, 32.0);
        assert_eq!(cost, 8.0);
        assert_eq!(profit, 24.0);
    }

    #[test]
    fn quantity_boundary_is_one_hundred() {
        let mut request = valid_request();
        request.items = vec![item(1.0, 0.5, 100)];
        assert!(request.validate().is_ok());

        request.items = vec![item(1.0, 0.5, 101)];
        assert!(matches!(
            request.validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let mut request = valid_request();
        request.items.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn pickup_date_accepts_date_and_datetime_forms() {
        let midnight = normalize_pickup_date("2026-09-01").expect("date");
        assert_eq!(midnight.to_rfc3339(), "2026-09-01T00:00:00+00:00");

        assert!(normalize_pickup_date("2026-09-01T10:30:00").is_ok());
        assert!(normalize_pickup_date("2026-09-01T10:30:00Z").is_ok());
        assert!(normalize_pickup_date("tomorrow").is_err());
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let request = UpdateOrderRequest {
            status: None,
            payment_status: None,
        };
        assert!(request.validate().is_err());

        let request = UpdateOrderRequest {
            status: Some(OrderStatus::Confirmed),
            payment_status: None,
        };
        assert!(request.validate().is_ok());
    }
}
