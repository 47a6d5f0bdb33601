use axum::Router;

use crate::state::AppState;

pub mod analytics;
pub mod auth;
pub mod doc;
pub mod events;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod profile;
pub mod uploads;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/profile", profile::router())
        .nest("/upload", uploads::router())
        .merge(payments::router())
        .merge(analytics::router())
        .merge(events::router())
}
