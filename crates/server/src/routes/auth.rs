//! Authentication route handlers.
//!
//! Sign-in and sign-up claim the session cart for the user (the guest cart
//! wins over any older cart of theirs); sign-out drops the cart with the
//! session.

use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::CartRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{OptionalUser, clear_current_user, set_current_user};
use crate::middleware::session::cart_token;
use crate::models::{CurrentUser, User};
use crate::routes::ActionResponse;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Forgot-password payload.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset-password payload. `token` is absent when a signed-in user changes
/// their password directly.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Establish the session for a freshly authenticated user and claim the
/// session cart.
async fn establish_session(state: &AppState, session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    if let Some(token) = cart_token(session).await {
        CartRepository::new(state.pool())
            .claim_for_user(token, user.id)
            .await?;
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Sign up with name, email, and password. Signs the user in immediately.
#[instrument(skip(state, session, request))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<ActionResponse>> {
    let user = AuthService::new(state.pool())
        .register(
            &request.name,
            &request.email,
            &request.password,
            &request.confirm_password,
        )
        .await?;

    establish_session(&state, &session, &user).await?;

    Ok(Json(ActionResponse::ok("Sign up successful")))
}

/// Sign in with email and password.
#[instrument(skip(state, session, request))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ActionResponse>> {
    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    establish_session(&state, &session, &user).await?;

    Ok(Json(ActionResponse::ok("Sign in successful")))
}

/// Sign out: drop the session cart and destroy the session.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Json<ActionResponse>> {
    if let Some(token) = cart_token(&session).await {
        CartRepository::new(state.pool())
            .delete_by_token(token)
            .await?;
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session user: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    clear_sentry_user();

    Ok(Json(ActionResponse::ok("Signed out")))
}

/// Send a password-reset email.
///
/// Always answers success so the endpoint can't be used to probe which
/// emails have accounts; failures are only logged.
#[instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ActionResponse>> {
    match AuthService::new(state.pool())
        .forgot_password(&request.email)
        .await
    {
        Ok((user, token)) => {
            let reset_url = format!(
                "{}/reset-password?token={}",
                state.config().base_url,
                token
            );
            let email_service = state.email().clone();
            let to = user.email.clone();
            tokio::spawn(async move {
                if let Err(e) = email_service.send_reset_password(&to, &reset_url).await {
                    tracing::warn!("Failed to send reset email: {e}");
                }
            });
        }
        Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => {
            tracing::debug!("Password reset requested for unknown email");
        }
        Err(other) => return Err(other.into()),
    }

    Ok(Json(ActionResponse::ok(
        "Reset password email sent successfully",
    )))
}

/// Reset the password: via token from the reset email, or directly when the
/// caller is signed in.
#[instrument(skip(state, user, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ActionResponse>> {
    let auth = AuthService::new(state.pool());

    let changed_user = if let Some(current) = user {
        auth.change_password(current.id, &request.password, &request.confirm_password)
            .await?;
        None
    } else {
        let token = request
            .token
            .as_deref()
            .ok_or(AppError::Auth(AuthError::InvalidResetToken))?;
        Some(
            auth.reset_password(token, &request.password, &request.confirm_password)
                .await?,
        )
    };

    // Alert the account owner; reset-by-token is the path an attacker would use
    if let Some(user) = changed_user {
        let email_service = state.email().clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_password_changed(&user.email, &user.name)
                .await
            {
                tracing::warn!("Failed to send password-changed email: {e}");
            }
        });
    }

    Ok(Json(ActionResponse::ok("Password was changed")))
}
