//! Account route handlers: password registration, login and logout.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tower_sessions::Session;
use tracing::instrument;

use threadline_core::{CredentialsBody, MessageResponse};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log it in.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(credentials) = body?;

    let user = AuthService::new(state.db())
        .register_with_password(&credentials.email, &credentials.password)
        .await?;
    start_session(&session, &user).await?;

    Ok(Json(MessageResponse::ok("Account created")))
}

/// Log in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    body: std::result::Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(credentials) = body?;

    let user = AuthService::new(state.db())
        .login_with_password(&credentials.email, &credentials.password)
        .await?;
    start_session(&session, &user).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(MessageResponse::ok("Logged in")))
}

/// Log out. Succeeds whether or not anyone was logged in.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(MessageResponse::ok("Logged out")))
}
