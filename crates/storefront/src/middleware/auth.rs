//! Authentication extractor and session helpers.
//!
//! The logged-in user stored in the session is the cart owner; cart handlers
//! take [`RequireAuth`] and never see a request without one.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Rejects with a JSON 401 when the session has no user (or no session layer
/// ran), and with a generic 500 when the session store fails.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("Not logged in".to_string()))?;

        let user = logged_in_user(session.get(session_keys::CURRENT_USER).await)?;

        tracing::Span::current().record("user_id", user.id.as_i64());

        Ok(Self(user))
    }
}

/// A missing user is a 401; a session store that cannot answer is a 500.
fn logged_in_user(
    stored: Result<Option<CurrentUser>, tower_sessions::session::Error>,
) -> Result<CurrentUser, AppError> {
    match stored {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::Unauthorized("Not logged in".to_string())),
        Err(e) => {
            tracing::error!(error = %e, "failed to read session");
            Err(AppError::Internal(format!("session read failed: {e}")))
        }
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
