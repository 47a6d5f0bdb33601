use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, record_audit},
    dto::orders::OrderItemWithProduct,
    dto::payments::{CreatePaymentLinkRequest, PaymentLinkResponse},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, is_admin},
    models::{Order, OrderItem, Product},
    response::ApiResponse,
    state::AppState,
    status::PaymentStatus,
    stripe::{EVENT_CHECKOUT_COMPLETED, EVENT_PAYMENT_FAILED, WebhookEvent},
};

use super::order_service;

pub async fn create_payment_link(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentLinkRequest,
) -> AppResult<ApiResponse<PaymentLinkResponse>> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(payload.order_id)
        .fetch_optional(&state.pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.user_id != user.user_id && !is_admin(&state.pool, user).await? {
        return Err(AppError::forbidden());
    }

    if order.payment_status == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Order is already paid".into()));
    }

    let items: Vec<OrderItem> =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at")
            .bind(order.id)
            .fetch_all(&state.pool)
            .await?;
    if items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }

    let mut lines: Vec<OrderItemWithProduct> = Vec::with_capacity(items.len());
    for item in items {
        let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_optional(&state.pool)
            .await?;
        lines.push(OrderItemWithProduct { item, product });
    }

    let redirect_url = format!("{}/orders/{}", state.config.site_url, order.id);
    let link = state
        .payments
        .create_payment_link(&order, &lines, &redirect_url)
        .await?;

    let existing = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    // A fresh link restarts the payment attempt.
    let mut active: OrderActive = existing.into();
    active.stripe_payment_link_id = Set(Some(link.id.clone()));
    active.payment_status = Set(PaymentStatus::Pending.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::PaymentLinkCreate,
        serde_json::json!({ "order_id": order.id, "payment_link_id": link.id }),
    )
    .await;

    Ok(ApiResponse::new(
        "Payment link created",
        PaymentLinkResponse {
            payment_url: link.url,
            payment_link_id: link.id,
        },
    ))
}

/// Dispatches a verified webhook event. Unknown event types are acknowledged
/// and ignored; the provider keeps sending whatever it is configured to.
pub async fn handle_webhook_event(state: &AppState, event: WebhookEvent) -> AppResult<()> {
    let payment_status = match event.kind.as_str() {
        EVENT_CHECKOUT_COMPLETED => PaymentStatus::Paid,
        EVENT_PAYMENT_FAILED => PaymentStatus::Failed,
        other => {
            tracing::debug!(kind = other, "ignoring webhook event");
            return Ok(());
        }
    };

    let order_id = event
        .order_id()
        .ok_or_else(|| AppError::BadRequest("webhook event has no orderId".into()))?;
    let order_id = Uuid::parse_str(order_id)
        .map_err(|_| AppError::BadRequest("webhook orderId is not a UUID".into()))?;

    order_service::apply_payment_event(state, order_id, payment_status).await
}
