//! Account route handlers (signed-in users).

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireUser, set_current_user};
use crate::models::User;
use crate::routes::ActionResponse;
use crate::state::AppState;

/// Profile update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Minimum display-name length.
const MIN_NAME_LENGTH: usize = 3;

/// Show the signed-in user's profile.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<User>> {
    let profile = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_owned()))?;

    Ok(Json(profile))
}

/// Update the display name, mirroring it into the session.
#[instrument(skip(state, session, user, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireUser(mut user): RequireUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ActionResponse>> {
    let name = request.name.trim();
    if name.len() < MIN_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }

    UserRepository::new(state.pool())
        .update_name(user.id, name)
        .await?;

    user.name = name.to_owned();
    set_current_user(&session, &user)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(ActionResponse::ok("Profile updated successfully")))
}
