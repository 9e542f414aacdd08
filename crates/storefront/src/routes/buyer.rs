//! Buyer dashboard handlers.
//!
//! Mounted under `/buyer`, which the role gate restricts to buyer sessions.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::db::{OrderRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireBuyer;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerDashboard {
    pub user: User,
    pub total_orders: i64,
    pub pending_orders: i64,
}

/// Account details and order counts.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<impl IntoResponse, AppError> {
    let user = UserRepository::new(state.pool())
        .get_by_id(buyer.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_owned()))?;
    let counts = OrderRepository::new(state.pool())
        .counts_for_buyer(buyer.id)
        .await?;

    Ok(Json(BuyerDashboard {
        user,
        total_orders: counts.total,
        pending_orders: counts.pending,
    }))
}

/// Orders placed by the session buyer.
pub async fn orders(
    State(state): State<AppState>,
    RequireBuyer(buyer): RequireBuyer,
) -> Result<impl IntoResponse, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_buyer(buyer.id)
        .await?;
    Ok(Json(orders))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use bazaar_core::Role;

    use crate::routes::testing::{bearer, send, test_state, user};

    #[tokio::test]
    async fn test_seller_token_redirected_from_buyer_paths() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        for path in ["/buyer/dashboard", "/buyer/orders"] {
            let response = send(
                &state,
                Request::get(path)
                    .header(header::AUTHORIZATION, bearer(&state, &seller))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                "/auth/login"
            );
        }
    }

    #[tokio::test]
    async fn test_expired_cookie_redirected() {
        let state = test_state(false);
        let buyer = user(Role::Buyer);
        let expired = state
            .session_keys()
            .issue_at(&buyer, chrono::Utc::now() - chrono::Duration::days(31))
            .unwrap();
        let response = send(
            &state,
            Request::get("/buyer/dashboard")
                .header(header::COOKIE, format!("bazaar_session={}", expired.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
