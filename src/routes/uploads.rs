use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    routing::{delete, post},
};

use crate::{
    dto::uploads::{DeleteUploadQuery, UploadResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image))
        .route("/image", delete(delete_image))
}

#[utoipa::path(
    post,
    path = "/api/upload/image",
    responses(
        (status = 200, description = "Image uploaded", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Wrong type or over the size limit"),
        (status = 403, description = "Admin access required"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    let response = upload_service::upload_image(&state, &user, multipart).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/upload/image",
    params(("file_name" = String, Query, description = "Stored file name, no path components")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 400, description = "Invalid file name"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "File not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Uploads"
)]
pub async fn delete_image(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DeleteUploadQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let response = upload_service::delete_image(&state, &user, &query.file_name).await?;
    Ok(Json(response))
}
