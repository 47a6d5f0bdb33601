use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyticsQuery {
    /// Window length in days, counted back from now. Defaults to 30; zero
    /// means all time.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsSummary {
    pub total_orders: i64,
    pub revenue: f64,
    pub profit: f64,
    pub pending_orders: i64,
    pub today_orders: i64,
    pub today_revenue: f64,
    pub status_counts: BTreeMap<String, i64>,
}
