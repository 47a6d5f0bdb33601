use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{db::DbPool, dto::auth::Claims, error::AppError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

/// Role check against the stored profile, not the token claim. A demoted
/// admin loses access on their next request even with a live token.
pub async fn is_admin(pool: &DbPool, user: &AuthUser) -> Result<bool, AppError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT role FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;

    Ok(matches!(row, Some((role,)) if role == "admin"))
}

pub async fn require_admin(pool: &DbPool, user: &AuthUser) -> Result<(), AppError> {
    if is_admin(pool, user).await? {
        Ok(())
    } else {
        Err(AppError::admin_required())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let user_id =
            Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role.clone(),
        })
    }
}
