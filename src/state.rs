use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    events::ChangeFeed,
    middleware::rate_limit::RateLimiter,
    stripe::PaymentLinkClient,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: AppConfig,
    pub events: ChangeFeed,
    pub payments: PaymentLinkClient,
    pub limiter: Arc<RateLimiter>,
}
