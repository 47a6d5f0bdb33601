//! Client-side cart model.
//!
//! The cart is never persisted server-side: it lives with the caller until
//! checkout converts it into an order. This module models that store so the
//! checkout payload and its derived totals are built in one place.

use uuid::Uuid;

use crate::dto::orders::{CreateOrderRequest, OrderItemInput, ProductSnapshot};
use crate::models::Product;
use crate::status::OrderStatus;

#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Merges into an existing line when the product is already in the cart,
    /// otherwise appends a new line.
    pub fn add_item(&mut self, product: Product, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine { product, quantity });
        }
    }

    /// Sets the quantity of a line; a quantity of zero or less removes it.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn total_items(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.product.price * f64::from(l.quantity))
            .sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.product.cost * f64::from(l.quantity))
            .sum()
    }

    /// Builds the order-creation payload from the cart contents. Prices and
    /// costs are snapshotted from the products as the cart saw them.
    pub fn checkout_request(
        &self,
        user_id: Uuid,
        pickup_date: impl Into<String>,
        delivery_method: impl Into<String>,
        notes: Option<String>,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            user_id,
            status: Some(OrderStatus::Pending),
            pickup_date: pickup_date.into(),
            delivery_method: delivery_method.into(),
            notes,
            customer_name: None,
            customer_phone: None,
            items: self
                .lines
                .iter()
                .map(|l| OrderItemInput {
                    product: ProductSnapshot {
                        id: l.product.id,
                        price: l.product.price,
                        cost: Some(l.product.cost),
                    },
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, price: f64, cost: f64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price,
            cost,
            category: "Breads".to_string(),
            available: true,
            image_url: None,
            lead_time_hours: Some(48),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn adding_the_same_product_merges_lines() {
        let baguette = product("Baguette", 16.0, 4.0);
        let mut cart = Cart::new();
        cart.add_item(baguette.clone(), 1);
        cart.add_item(baguette, 1);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(cart.total_price(), 32.0);
    }

    #[test]
    fn zero_quantity_update_removes_the_line() {
        let loaf = product("Sandwich Loaf", 11.0, 3.85);
        let id = loaf.id;
        let mut cart = Cart::new();
        cart.add_item(loaf, 2);
        cart.update_quantity(id, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn totals_sum_over_lines() {
        let mut cart = Cart::new();
        cart.add_item(product("Baguette", 16.0, 4.0), 2);
        cart.add_item(product("Croissant", 5.5, 1.5), 3);

        assert_eq!(cart.total_items(), 5);
        assert!((cart.total_price() - 48.5).abs() < 1e-9);
        assert!((cart.total_cost() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn checkout_request_snapshots_products() {
        let baguette = product("Baguette", 16.0, 4.0);
        let baguette_id = baguette.id;
        let user_id = Uuid::new_v4();

        let mut cart = Cart::new();
        cart.add_item(baguette, 2);

        let request = cart.checkout_request(user_id, "2026-09-01", "pickup", None);
        assert_eq!(request.user_id, user_id);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].product.id, baguette_id);
        assert_eq!(request.items[0].product.price, 16.0);
        assert_eq!(request.items[0].quantity, 2);
    }
}
