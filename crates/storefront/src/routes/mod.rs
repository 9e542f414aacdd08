//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database)
//! GET  /init                        - Load demo data (when enabled)
//!
//! # Auth
//! POST /auth/register               - Create an account
//! GET  /auth/login                  - Login hint (redirect target)
//! POST /auth/login                  - Password login, issues session token
//! GET  /auth/session                - Current session claims
//! POST /auth/refresh                - Re-issue a still-valid token
//! POST /auth/logout                 - Clear the session cookie
//!
//! # Products
//! GET    /products                  - Search active listings
//! POST   /products                  - Create listing (multipart, seller)
//! GET    /products/{id}             - Listing with seller details
//! PUT    /products/{id}             - Update listing (JSON or multipart, owner)
//! DELETE /products/{id}             - Delete listing (owner)
//! GET    /products/{id}/reviews     - Reviews
//! POST   /products/{id}/reviews     - Add review
//! GET    /products/{id}/faqs        - FAQs
//! POST   /products/{id}/faqs        - Add FAQ (owner)
//! DELETE /products/{id}/faqs        - Remove FAQ (owner)
//!
//! # Users
//! GET  /users/{id}                  - Profile
//! PUT  /users/{id}                  - Edit own profile
//!
//! # Dashboards (role gated)
//! GET  /seller/dashboard            - Catalog and order summary
//! GET  /seller/orders               - Orders received
//! PUT  /seller/orders/{id}/status   - Advance an order
//! GET  /buyer/dashboard             - Account and order summary
//! GET  /buyer/orders                - Orders placed
//! ```

pub mod auth;
pub mod buyer;
pub mod faqs;
pub mod health;
pub mod init;
pub mod products;
pub mod reviews;
pub mod seller;
pub mod users;

use std::str::FromStr;

use axum::{
    Router,
    extract::{FromRequest, rejection::JsonRejection},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections render as `AppError::BadRequest`.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

/// Parse a path or query identifier, naming it in the error.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/session", get(auth::session))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/{id}/reviews", get(reviews::index).post(reviews::create))
        .route(
            "/{id}/faqs",
            get(faqs::index).post(faqs::create).delete(faqs::destroy),
        )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/{id}", get(users::show).put(users::update))
}

/// Create the seller dashboard routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(seller::dashboard))
        .route("/orders", get(seller::orders))
        .route("/orders/{id}/status", put(seller::update_order_status))
}

/// Create the buyer dashboard routes router.
pub fn buyer_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(buyer::dashboard))
        .route("/orders", get(buyer::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/init", get(init::init))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/users", user_routes())
        .nest("/seller", seller_routes())
        .nest("/buyer", buyer_routes())
}
