use std::path::Path;

use axum::extract::Multipart;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, record_audit},
    dto::uploads::UploadResponse,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin},
    response::ApiResponse,
    state::AppState,
};

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Checks type and size before anything touches disk; returns the extension
/// to store under.
fn validate_image(content_type: &str, len: usize) -> Result<&'static str, AppError> {
    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::BadRequest("Only JPEG, PNG, and WebP images are accepted".into())
    })?;
    if len == 0 {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("Image exceeds the 5MB limit".into()));
    }
    Ok(ext)
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadResponse>> {
    require_admin(&state.pool, user).await?;

    let mut file: Option<(String, axum::body::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .ok_or_else(|| AppError::BadRequest("image field needs a content type".into()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
        file = Some((content_type, data));
        break;
    }

    let (content_type, data) =
        file.ok_or_else(|| AppError::BadRequest("missing image field".into()))?;

    let ext = validate_image(&content_type, data.len())?;

    let file_name = format!(
        "product_{}_{}.{ext}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    );

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let path = Path::new(&state.config.upload_dir).join(&file_name);
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let image_url = format!("{}/uploads/{}", state.config.site_url, file_name);

    record_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ImageUpload,
        serde_json::json!({ "file_name": file_name, "bytes": data.len() }),
    )
    .await;

    Ok(ApiResponse::new(
        "Image uploaded",
        UploadResponse {
            image_url,
            file_name,
        },
    ))
}

pub async fn delete_image(
    state: &AppState,
    user: &AuthUser,
    file_name: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require_admin(&state.pool, user).await?;

    // The name must stay inside the upload directory.
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(AppError::BadRequest("Invalid file name".into()));
    }

    let path = Path::new(&state.config.upload_dir).join(file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound);
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    }

    record_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ImageDelete,
        serde_json::json!({ "file_name": file_name }),
    )
    .await;

    Ok(ApiResponse::new("Deleted", serde_json::json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_image_content_types_map_to_extensions() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn size_limit_sits_at_five_megabytes() {
        let mb = 1024 * 1024;
        assert!(validate_image("image/jpeg", 6 * mb).is_err());
        assert!(matches!(
            validate_image("image/jpeg", (4.9 * mb as f64) as usize),
            Ok("jpg")
        ));
        assert!(validate_image("image/png", 0).is_err());
    }
}
