use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    audit::{AuditAction, record_audit},
    dto::profile::UpdateProfileRequest,
    entity::profiles::{ActiveModel, Entity as Profiles, Model as ProfileModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
    state::AppState,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    match profile {
        Some(p) => Ok(ApiResponse::new("Profile", p)),
        None => Err(AppError::NotFound),
    }
}

/// Sparse merge: absent fields keep their stored value, present fields
/// overwrite it.
pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    payload.validate()?;

    let existing = Profiles::find_by_id(user.user_id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(Some(name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    active.updated_at = Set(Utc::now().into());

    let profile = active.update(&state.orm).await?;

    record_audit(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProfileUpdate,
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::new(
        "Profile updated",
        profile_from_entity(profile),
    ))
}

fn profile_from_entity(model: ProfileModel) -> Profile {
    Profile {
        id: model.id,
        email: model.email,
        password_hash: model.password_hash,
        name: model.name,
        phone: model.phone,
        address: model.address,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
