use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use chrono::Utc;

use crate::{
    dto::payments::{CreatePaymentLinkRequest, PaymentLinkResponse, WebhookAck},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
    stripe::{WebhookEvent, verify_signature},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-payment-link", post(create_payment_link))
        .route("/webhook/stripe", post(stripe_webhook))
}

#[utoipa::path(
    post,
    path = "/api/create-payment-link",
    request_body = CreatePaymentLinkRequest,
    responses(
        (status = 200, description = "Payment link created", body = ApiResponse<PaymentLinkResponse>),
        (status = 403, description = "Not the order owner"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment_link(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePaymentLinkRequest>,
) -> AppResult<Json<ApiResponse<PaymentLinkResponse>>> {
    let response = payment_service::create_payment_link(&state, &user, payload).await?;
    Ok(Json(response))
}

/// The webhook takes the raw body because the signature covers the exact
/// bytes the provider sent.
#[utoipa::path(
    post,
    path = "/api/webhook/stripe",
    responses(
        (status = 200, description = "Event processed", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Missing or invalid signature"),
    ),
    tag = "Payments"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::WebhookSignature)?;

    verify_signature(
        body.as_bytes(),
        signature,
        &state.config.stripe_webhook_secret,
        Utc::now().timestamp(),
    )?;

    let event = WebhookEvent::parse(body.as_bytes())?;
    payment_service::handle_webhook_event(&state, event).await?;

    Ok(Json(ApiResponse::new(
        "Webhook processed",
        WebhookAck { received: true },
    )))
}
