//! Admin user management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use oxcart_core::{UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::models::User;
use crate::routes::{ActionResponse, PAGE_SIZE, PageQuery, Paginated};
use crate::state::AppState;

/// User edit payload.
#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub name: String,
    pub role: String,
}

/// All users, newest first, optionally filtered by a name/email fragment.
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<User>>> {
    let users = UserRepository::new(state.pool());

    let data = users
        .list(page.filter(), PAGE_SIZE, page.offset())
        .await?;
    let total = users.count().await?;

    Ok(Json(Paginated::new(data, total, PAGE_SIZE)))
}

/// Edit a user's name and role.
#[instrument(skip(state, admin, request))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(request): Json<EditUserRequest>,
) -> Result<Json<ActionResponse>> {
    let role: UserRole = request
        .role
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    // Demoting yourself would lock the last admin out mid-session
    if id == admin.id && role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "cannot remove your own admin role".to_owned(),
        ));
    }

    UserRepository::new(state.pool())
        .update_name_and_role(id, request.name.trim(), role)
        .await?;

    Ok(Json(ActionResponse::ok("User edited successfully")))
}

/// Delete a user.
#[instrument(skip(state, admin))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Json<ActionResponse>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "cannot delete your own account".to_owned(),
        ));
    }

    let deleted = UserRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("user {id}")));
    }

    Ok(Json(ActionResponse::ok("User deleted successfully")))
}
