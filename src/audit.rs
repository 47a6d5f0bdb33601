use serde_json::Value;
use uuid::Uuid;

use crate::db::DbPool;

/// Mutations the API keeps a trail of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    ProfileUpdate,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    OrderCreate,
    OrderUpdate,
    PaymentLinkCreate,
    PaymentWebhook,
    ImageUpload,
    ImageDelete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::ProfileUpdate => "profile_update",
            AuditAction::ProductCreate => "product_create",
            AuditAction::ProductUpdate => "product_update",
            AuditAction::ProductDelete => "product_delete",
            AuditAction::OrderCreate => "order_create",
            AuditAction::OrderUpdate => "order_update",
            AuditAction::PaymentLinkCreate => "payment_link_create",
            AuditAction::PaymentWebhook => "payment_webhook",
            AuditAction::ImageUpload => "image_upload",
            AuditAction::ImageDelete => "image_delete",
        }
    }

    /// The resource the action touched, stored alongside it.
    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister | AuditAction::UserLogin | AuditAction::ProfileUpdate => {
                "profiles"
            }
            AuditAction::ProductCreate
            | AuditAction::ProductUpdate
            | AuditAction::ProductDelete => "products",
            AuditAction::OrderCreate
            | AuditAction::OrderUpdate
            | AuditAction::PaymentLinkCreate
            | AuditAction::PaymentWebhook => "orders",
            AuditAction::ImageUpload | AuditAction::ImageDelete => "uploads",
        }
    }
}

/// Appends one audit row. A failed write is logged and dropped; the audit
/// trail never fails the request that produced it. `actor` is `None` for
/// writes not tied to a signed-in user, such as webhooks.
pub async fn record_audit(pool: &DbPool, actor: Option<Uuid>, action: AuditAction, metadata: Value) {
    let result = sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await;

    if let Err(err) = result {
        tracing::warn!(error = %err, action = action.as_str(), "audit write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_map_to_their_resources() {
        assert_eq!(AuditAction::OrderCreate.resource(), "orders");
        assert_eq!(AuditAction::PaymentWebhook.resource(), "orders");
        assert_eq!(AuditAction::ImageDelete.resource(), "uploads");
        assert_eq!(AuditAction::UserLogin.resource(), "profiles");
        assert_eq!(AuditAction::ProductDelete.as_str(), "product_delete");
    }
}
