use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::{
    dto::analytics::{AnalyticsQuery, AnalyticsSummary},
    error::AppResult,
    middleware::auth::{AuthUser, require_admin},
    models::Order,
    response::ApiResponse,
    state::AppState,
    status::{OrderStatus, PaymentStatus},
};

const DEFAULT_WINDOW_DAYS: i64 = 30;

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
    query: AnalyticsQuery,
) -> AppResult<ApiResponse<AnalyticsSummary>> {
    require_admin(&state.pool, user).await?;

    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS).max(0);

    let orders: Vec<Order> = sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    let summary = compute_summary(&orders, days, Utc::now());
    Ok(ApiResponse::new("Analytics", summary))
}

/// Pure aggregation over the full order list. `days` restricts the window,
/// counted back from `now`; zero means all time. Revenue and profit only
/// count paid orders; cancelled orders still count toward order totals so
/// the dashboard reflects demand, not just fulfillment.
pub fn compute_summary(orders: &[Order], days: i64, now: DateTime<Utc>) -> AnalyticsSummary {
    let today = now.date_naive();
    let since = (days > 0).then(|| now - Duration::days(days));
    let paid = PaymentStatus::Paid.as_str();

    let mut total_orders = 0;
    let mut revenue = 0.0;
    let mut profit = 0.0;
    let mut pending_orders = 0;
    let mut today_orders = 0;
    let mut today_revenue = 0.0;
    let mut status_counts: BTreeMap<String, i64> = BTreeMap::new();

    for order in orders {
        if since.is_some_and(|cutoff| order.created_at < cutoff) {
            continue;
        }
        total_orders += 1;
        *status_counts.entry(order.status.clone()).or_default() += 1;

        if order.payment_status == paid {
            revenue += order.total;
            profit += order.profit;
        }
        if order.status == OrderStatus::Pending.as_str() {
            pending_orders += 1;
        }
        if order.created_at.date_naive() == today {
            today_orders += 1;
            if order.payment_status == paid {
                today_revenue += order.total;
            }
        }
    }

    AnalyticsSummary {
        total_orders,
        revenue,
        profit,
        pending_orders,
        today_orders,
        today_revenue,
        status_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn order(
        status: &str,
        payment_status: &str,
        total: f64,
        profit: f64,
        created_at: DateTime<Utc>,
    ) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_number: "ORD-20260901-abcd1234".into(),
            status: status.into(),
            payment_status: payment_status.into(),
            total,
            cost: total - profit,
            profit,
            pickup_date: created_at,
            delivery_method: "pickup".into(),
            notes: None,
            stripe_payment_link_id: None,
            customer_name: None,
            customer_phone: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn revenue_and_profit_only_count_paid_orders() {
        let now = Utc::now();
        let orders = vec![
            order("confirmed", "paid", 32.0, 24.0, now),
            order("pending", "pending", 11.0, 7.15, now),
            order("cancelled", "failed", 50.0, 20.0, now - Duration::days(2)),
        ];

        let summary = compute_summary(&orders, 0, now);
        assert_eq!(summary.total_orders, 3);
        assert_eq!(summary.revenue, 32.0);
        assert_eq!(summary.profit, 24.0);
        assert_eq!(summary.pending_orders, 1);
    }

    #[test]
    fn window_excludes_older_orders_and_zero_means_all_time() {
        let now = Utc::now();
        let orders = vec![
            order("confirmed", "paid", 10.0, 5.0, now),
            order("completed", "paid", 90.0, 30.0, now - Duration::days(40)),
        ];

        let windowed = compute_summary(&orders, 30, now);
        assert_eq!(windowed.total_orders, 1);
        assert_eq!(windowed.revenue, 10.0);

        let all_time = compute_summary(&orders, 0, now);
        assert_eq!(all_time.total_orders, 2);
        assert_eq!(all_time.revenue, 100.0);
    }

    #[test]
    fn today_buckets_ignore_older_orders() {
        let now = Utc::now();
        let orders = vec![
            order("confirmed", "paid", 20.0, 10.0, now),
            order("completed", "paid", 40.0, 15.0, now - Duration::days(3)),
        ];

        let summary = compute_summary(&orders, 0, now);
        assert_eq!(summary.today_orders, 1);
        assert_eq!(summary.today_revenue, 20.0);
        assert_eq!(summary.revenue, 60.0);
    }

    #[test]
    fn status_counts_cover_every_status_seen() {
        let now = Utc::now();
        let orders = vec![
            order("pending", "pending", 1.0, 0.5, now),
            order("pending", "pending", 1.0, 0.5, now),
            order("baking", "paid", 2.0, 1.0, now),
        ];

        let summary = compute_summary(&orders, 0, now);
        assert_eq!(summary.status_counts.get("pending"), Some(&2));
        assert_eq!(summary.status_counts.get("baking"), Some(&1));
        assert_eq!(summary.status_counts.get("ready"), None);
    }
}
