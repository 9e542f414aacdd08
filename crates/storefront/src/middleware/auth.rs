//! Authentication extractors.
//!
//! Session tokens are read from `Authorization: Bearer <token>` first and the
//! session cookie second. Claims verified earlier in the request (by the role
//! gate) are reused from the request extensions.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use cookie::Cookie;

use crate::models::CurrentUser;
use crate::services::auth::{SESSION_COOKIE, SessionClaims, SessionKeys};
use crate::state::AppState;

/// Extract the raw session token from request headers.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned())
}

/// Verify the request's session token, if it carries one.
///
/// Any verification failure is treated as "no session".
#[must_use]
pub fn authenticate(headers: &HeaderMap, keys: &SessionKeys) -> Option<SessionClaims> {
    let token = token_from_headers(headers)?;
    match keys.verify(&token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session token");
            None
        }
    }
}

fn claims_from_parts(parts: &Parts, state: &AppState) -> Option<SessionClaims> {
    if let Some(claims) = parts.extensions.get::<SessionClaims>() {
        return Some(claims.clone());
    }
    authenticate(&parts.headers, state.session_keys())
}

/// Error returned when a request lacks the required session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (role-gated dashboard paths).
    RedirectToLogin,
    /// Unauthorized response (API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            )
                .into_response(),
        }
    }
}

/// Extractor that requires a valid session of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        claims_from_parts(parts, &state)
            .map(|claims| Self(claims.current_user()))
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that requires a valid seller session.
pub struct RequireSeller(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireSeller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_seller() {
            tracing::debug!(user_id = %user.id, role = %user.role, "Seller session required");
            return Err(AuthRejection::Unauthorized);
        }
        Ok(Self(user))
    }
}

/// Extractor that requires a valid buyer session.
pub struct RequireBuyer(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireBuyer
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_buyer() {
            return Err(AuthRejection::Unauthorized);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if there is no session.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Self(
            claims_from_parts(parts, &state).map(|claims| claims.current_user()),
        ))
    }
}

/// Extractor for the verified claims themselves (session introspection and refresh).
pub struct RequireSession(pub SessionClaims);

impl<S> FromRequestParts<S> for RequireSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        claims_from_parts(parts, &state)
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; bazaar_session=tok123; other=1"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(header::COOKIE, HeaderValue::from_static("bazaar_session=from-cookie"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(header::COOKIE, HeaderValue::from_static("bazaar_session="));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn test_rejection_responses() {
        let redirect = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
