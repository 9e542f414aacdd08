//! Demo data bootstrap endpoint.
//!
//! Only routed when `STOREFRONT_DEMO_SEED=true`; otherwise it answers 404
//! like any unknown path.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::error::AppError;
use crate::services::demo::{DemoCredentials, SeedOutcome, seed_demo};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeedResponse {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seller: Option<DemoCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buyer: Option<DemoCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<usize>,
}

impl From<SeedOutcome> for SeedResponse {
    fn from(outcome: SeedOutcome) -> Self {
        match outcome {
            SeedOutcome::Created {
                seller,
                buyer,
                products,
            } => Self {
                message: "Demo data initialized successfully",
                seller: Some(seller),
                buyer: Some(buyer),
                products: Some(products),
            },
            SeedOutcome::AlreadyInitialized => Self {
                message: "Demo data already initialized",
                seller: None,
                buyer: None,
                products: None,
            },
        }
    }
}

/// Load the demo dataset.
pub async fn init(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if !state.config().demo_seed {
        return Err(AppError::NotFound("Route".to_owned()));
    }

    let outcome = seed_demo(state.pool()).await?;
    Ok(Json(SeedResponse::from(outcome)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use super::*;
    use crate::routes::testing::{json_body, send, test_state};

    #[tokio::test]
    async fn test_init_disabled_is_not_found() {
        let state = test_state(false);
        let response = send(&state, Request::get("/init").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_already_initialized_message() {
        let json = serde_json::to_value(SeedResponse::from(SeedOutcome::AlreadyInitialized))
            .unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Demo data already initialized" }));
    }

    #[tokio::test]
    async fn test_created_response_lists_credentials() {
        let response = Json(SeedResponse::from(SeedOutcome::Created {
            seller: DemoCredentials {
                email: "seller@demo.com".to_owned(),
                password: "demo123".to_owned(),
            },
            buyer: DemoCredentials {
                email: "buyer@demo.com".to_owned(),
                password: "demo123".to_owned(),
            },
            products: 8,
        }))
        .into_response();

        let json = json_body(response).await;
        assert_eq!(json["seller"]["email"], "seller@demo.com");
        assert_eq!(json["buyer"]["password"], "demo123");
        assert_eq!(json["products"], 8);
    }
}
