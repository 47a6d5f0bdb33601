use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        analytics::AnalyticsSummary,
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            CreateOrderRequest, OrderItemInput, OrderItemWithProduct, OrderList, OrderWithItems,
            ProductSnapshot, ProfileSummary, UpdateOrderRequest,
        },
        payments::{CreatePaymentLinkRequest, PaymentLinkResponse, WebhookAck},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        profile::UpdateProfileRequest,
        uploads::UploadResponse,
    },
    events::{ChangeAction, ChangeEvent, Collection},
    models::{Order, OrderItem, Product, Profile},
    response::{ApiResponse, Meta},
    routes::{
        analytics, auth, events, health, orders, params, payments, products, profile, uploads,
    },
    status::{OrderStatus, PaymentStatus},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order,
        profile::get_profile,
        profile::update_profile,
        payments::create_payment_link,
        payments::stripe_webhook,
        uploads::upload_image,
        uploads::delete_image,
        analytics::dashboard,
        events::change_stream,
    ),
    components(
        schemas(
            Profile,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            ProductSnapshot,
            OrderItemInput,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderItemWithProduct,
            OrderWithItems,
            OrderList,
            ProfileSummary,
            UpdateProfileRequest,
            CreatePaymentLinkRequest,
            PaymentLinkResponse,
            WebhookAck,
            UploadResponse,
            AnalyticsSummary,
            Collection,
            ChangeAction,
            ChangeEvent,
            params::Pagination,
            params::ProductQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<Profile>,
            ApiResponse<AnalyticsSummary>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Products", description = "Menu catalog"),
        (name = "Orders", description = "Order placement and lifecycle"),
        (name = "Profile", description = "Customer profile"),
        (name = "Payments", description = "Payment links and the provider webhook"),
        (name = "Uploads", description = "Product image storage"),
        (name = "Analytics", description = "Admin dashboard aggregates"),
        (name = "Events", description = "Change notification stream"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
