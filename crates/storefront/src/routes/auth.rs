//! Authentication route handlers.
//!
//! Registration, password login and the stateless session lifecycle. Login
//! and refresh return the signed token in the body and also set it as the
//! `HttpOnly` session cookie for browser clients.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireSession;
use crate::models::{CurrentUser, User};
use crate::routes::ApiJson;
use crate::services::auth::token::expired_session_cookie;
use crate::services::auth::{AuthError, AuthService, IssuedToken, RegistrationForm};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Login request body.
///
/// `role` mirrors the hint sent by the login form and is accepted but not
/// used: the role always comes from the stored account.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisteredResponse {
    message: &'static str,
    user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    user: CurrentUser,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginHint {
    message: &'static str,
    login_url: &'static str,
    method: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegistrationForm>,
) -> Result<impl IntoResponse, AppError> {
    let registration = form.validate()?;
    let user = AuthService::new(state.pool()).register(registration).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// Where unauthenticated dashboard requests are redirected.
pub async fn login_page() -> impl IntoResponse {
    Json(LoginHint {
        message: "Authentication required",
        login_url: "/auth/login",
        method: "POST",
    })
}

/// Password login.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AuthError::InvalidCredentials.into());
    }
    if let Some(role) = request.role.as_deref() {
        tracing::debug!(role_hint = role, "Ignoring login role hint");
    }

    let user = AuthService::new(state.pool())
        .login(&request.email, &request.password)
        .await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, role = %user.role, "Login successful");

    let issued = state.session_keys().issue(&CurrentUser::from(&user))?;
    Ok(session_response(&state, issued))
}

/// Claims of the current session.
pub async fn session(RequireSession(claims): RequireSession) -> impl IntoResponse {
    Json(SessionResponse {
        token: None,
        expires_at: claims.expires_at(),
        user: claims.current_user(),
    })
}

/// Re-issue the current session with a fresh validity window.
pub async fn refresh(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
) -> Result<Response, AppError> {
    let issued = state.session_keys().issue(&claims.current_user())?;
    tracing::debug!(user_id = %claims.sub, "Session refreshed");
    Ok(session_response(&state, issued))
}

/// Clear the session cookie.
///
/// Tokens are stateless, so a copy held elsewhere stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    let cookie = expired_session_cookie(state.config().secure_cookies());
    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    )
}

fn session_response(state: &AppState, issued: IssuedToken) -> Response {
    let IssuedToken { token, claims } = issued;
    let cookie = state
        .session_keys()
        .session_cookie(token.clone(), state.config().secure_cookies());

    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(SessionResponse {
            token: Some(token),
            expires_at: claims.expires_at(),
            user: claims.current_user(),
        }),
    )
        .into_response()
}
