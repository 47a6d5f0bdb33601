//! Payment-link provider client and webhook verification.
//!
//! The provider hosts the checkout page; we create a payment link per order
//! and learn the outcome asynchronously through a signed webhook. Signatures
//! follow the Stripe scheme: an HMAC-SHA256 of `"{timestamp}.{body}"` carried
//! in a `t=...,v1=...` header, with a tolerance window against replay.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::dto::orders::OrderItemWithProduct;
use crate::error::{AppError, AppResult};
use crate::models::Order;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Webhook signature verification
// ---------------------------------------------------------------------------

/// Verifies a `t=<unix>,v1=<hex>` signature header against the raw payload.
/// `now` is passed in so the tolerance window is testable.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::WebhookSignature)?;
    if candidates.is_empty() {
        return Err(AppError::WebhookSignature);
    }

    if (now_unix - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::WebhookSignature);
    }

    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::WebhookSignature)?;
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        // verify_slice is constant-time.
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::WebhookSignature)
}

// ---------------------------------------------------------------------------
// Webhook events
// ---------------------------------------------------------------------------

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("malformed webhook payload: {e}")))
    }

    pub fn order_id(&self) -> Option<&str> {
        self.data.object.metadata.get("orderId").map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Payment-link creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PaymentLinkClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    pub url: String,
}

impl PaymentLinkClient {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Creates a hosted payment link for an order. The provider takes the
    /// form-encoded nested-key style; amounts are integer cents.
    pub async fn create_payment_link(
        &self,
        order: &Order,
        items: &[OrderItemWithProduct],
        redirect_url: &str,
    ) -> AppResult<PaymentLink> {
        let params = payment_link_params(order, items, redirect_url);

        let response = self
            .http
            .post(format!("{}/v1/payment_links", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(e.into()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "payment link creation failed");
            return Err(AppError::PaymentProvider(anyhow::anyhow!(
                "provider returned {status}"
            )));
        }

        response
            .json::<PaymentLink>()
            .await
            .map_err(|e| AppError::PaymentProvider(e.into()))
    }
}

pub fn payment_link_params(
    order: &Order,
    items: &[OrderItemWithProduct],
    redirect_url: &str,
) -> Vec<(String, String)> {
    let mut params = Vec::new();

    for (i, line) in items.iter().enumerate() {
        let name = line
            .product
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown Product".to_string());

        params.push((
            format!("line_items[{i}][price_data][currency]"),
            "usd".to_string(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            name,
        ));
        if let Some(description) = line.product.as_ref().and_then(|p| p.description.clone()) {
            params.push((
                format!("line_items[{i}][price_data][product_data][description]"),
                description,
            ));
        }
        params.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            to_cents(line.item.price).to_string(),
        ));
        params.push((
            format!("line_items[{i}][quantity]"),
            line.item.quantity.to_string(),
        ));
    }

    params.push(("metadata[orderId]".to_string(), order.id.to_string()));
    params.push((
        "metadata[orderNumber]".to_string(),
        order.order_number.clone(),
    ));
    params.push((
        "after_completion[type]".to_string(),
        "redirect".to_string(),
    ));
    params.push((
        "after_completion[redirect][url]".to_string(),
        redirect_url.to_string(),
    ));

    params
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;
    use chrono::Utc;
    use uuid::Uuid;

    const SECRET: &str = "whsec_test";

    fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn signed_payload_verifies_within_tolerance() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_payload(payload, SECRET, 1_000_000);

        assert!(verify_signature(payload, &header, SECRET, 1_000_000).is_ok());
        assert!(verify_signature(payload, &header, SECRET, 1_000_000 + 299).is_ok());
    }

    #[test]
    fn stale_or_tampered_signatures_are_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_payload(payload, SECRET, 1_000_000);

        // Outside the tolerance window.
        assert!(verify_signature(payload, &header, SECRET, 1_000_000 + 301).is_err());
        // Wrong secret.
        assert!(verify_signature(payload, &header, "whsec_other", 1_000_000).is_err());
        // Body changed after signing.
        assert!(verify_signature(b"{}", &header, SECRET, 1_000_000).is_err());
        // Header missing parts.
        assert!(verify_signature(payload, "t=1000000", SECRET, 1_000_000).is_err());
        assert!(verify_signature(payload, "v1=abcd", SECRET, 1_000_000).is_err());
    }

    #[test]
    fn webhook_event_exposes_the_order_id() {
        let payload = br#"{
            "type": "checkout.session.completed",
            "data": {"object": {"metadata": {"orderId": "abc-123"}}}
        }"#;
        let event = WebhookEvent::parse(payload).expect("event");
        assert_eq!(event.kind, EVENT_CHECKOUT_COMPLETED);
        assert_eq!(event.order_id(), Some("abc-123"));
    }

    #[test]
    fn params_carry_line_items_in_cents_and_order_metadata() {
        let order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_number: "ORD-20260901-abcd1234".into(),
            status: "pending".into(),
            payment_status: "pending".into(),
            total: 32.0,
            cost: 8.0,
            profit: 24.0,
            pickup_date: Utc::now(),
            delivery_method: "pickup".into(),
            notes: None,
            stripe_payment_link_id: None,
            customer_name: None,
            customer_phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let items = vec![OrderItemWithProduct {
            item: OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: Uuid::new_v4(),
                quantity: 2,
                price: 16.0,
                created_at: Utc::now(),
            },
            product: None,
        }];

        let params = payment_link_params(&order, &items, "http://localhost/orders/1");
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("1600"));
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(
            get("line_items[0][price_data][product_data][name]"),
            Some("Unknown Product")
        );
        assert_eq!(
            get("metadata[orderNumber]"),
            Some("ORD-20260901-abcd1234")
        );
        assert_eq!(get("after_completion[type]"), Some("redirect"));
    }
}
