//! User profile handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use bazaar_core::UserId;

use super::{ApiJson, parse_id};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::ProfileUpdate;
use crate::state::AppState;

/// Public profile of an account.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<UserId>(&id, "user")?;
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))?;
    Ok(Json(user))
}

/// Edit the session user's own profile.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<UserId>(&id, "user")?;
    if id != current.id {
        tracing::warn!(user_id = %current.id, target = %id, "Refusing to edit another profile");
        return Err(AppError::Unauthorized);
    }

    let update = update.validate().map_err(AppError::BadRequest)?;
    let user = UserRepository::new(state.pool())
        .update_profile(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))?;

    tracing::info!(user_id = %id, "Profile updated");
    Ok(Json(user))
}
