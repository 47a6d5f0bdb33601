use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::analytics::{AnalyticsQuery, AnalyticsSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/analytics",
    params(("days" = Option<i64>, Query, description = "Window in days, default 30, 0 for all time")),
    responses(
        (status = 200, description = "Dashboard summary", body = ApiResponse<AnalyticsSummary>),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<ApiResponse<AnalyticsSummary>>> {
    let response = analytics_service::dashboard(&state, &user, query).await?;
    Ok(Json(response))
}
