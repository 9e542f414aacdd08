//! Role-scoped path gating.
//!
//! `/seller` and everything below it requires a seller session; `/buyer`
//! and everything below it requires a buyer session. Requests that fail the
//! check are redirected to the login page before routing. Other paths pass
//! through untouched.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use bazaar_core::Role;

use super::auth::{AuthRejection, authenticate};
use crate::state::AppState;

/// Role required for `path`, if any.
///
/// Matching is by whole path segment: `/sellers` is not under `/seller`.
#[must_use]
pub fn required_role(path: &str) -> Option<Role> {
    [("/seller", Role::Seller), ("/buyer", Role::Buyer)]
        .into_iter()
        .find(|(prefix, _)| {
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .map(|(_, role)| role)
}

/// Middleware enforcing [`required_role`].
///
/// On success the verified claims are stored in the request extensions so
/// the handler's extractors do not verify the token a second time.
pub async fn role_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(role) = required_role(request.uri().path()) else {
        return next.run(request).await;
    };

    match authenticate(request.headers(), state.session_keys()) {
        Some(claims) if claims.role == role => {
            tracing::Span::current().record("user_id", tracing::field::display(claims.sub));
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Some(claims) => {
            tracing::debug!(
                user_id = %claims.sub,
                role = %claims.role,
                required = %role,
                path = %request.uri().path(),
                "Wrong role for gated path"
            );
            AuthRejection::RedirectToLogin.into_response()
        }
        None => AuthRejection::RedirectToLogin.into_response(),
    }
}
