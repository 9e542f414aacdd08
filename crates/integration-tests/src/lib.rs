//! End-to-end tests for the Bazaar storefront.
//!
//! Every test talks to a running server over HTTP and is `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! STOREFRONT_DEMO_SEED=true cargo run -p bazaar-storefront &
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` points the tests at another host
//! (default `http://localhost:3000`).

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Build a client that keeps cookies and never follows redirects, so
/// role-gate redirects stay observable.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A freshly registered account and its session token.
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl TestAccount {
    /// `Authorization` header value for this account.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// A unique throwaway email address.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Register a new account with the given role and log it in.
///
/// # Panics
///
/// Panics if registration or login does not succeed.
pub async fn register_and_login(client: &Client, role: &str) -> TestAccount {
    let base_url = base_url();
    let email = unique_email(role);
    let password = "integration-pass".to_string();

    let resp = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({
            "name": format!("Integration {role}"),
            "email": email,
            "password": password,
            "confirmPassword": password,
            "role": role,
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("login token").to_string();
    let id = body["user"]["id"].as_str().expect("user id").to_string();

    TestAccount {
        id,
        email,
        password,
        token,
    }
}

/// Create a minimal listing owned by `seller` and return its JSON.
///
/// # Panics
///
/// Panics if the listing is not created.
pub async fn create_product(client: &Client, seller: &TestAccount, name: &str) -> Value {
    let form = reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("description", "Created by the integration suite")
        .text("price", "2499")
        .text("originalPrice", "4999")
        .text("category", "Electronics")
        .text("stock", "5")
        .text("sellerId", seller.id.clone());

    let resp = client
        .post(format!("{}/products", base_url()))
        .header("Authorization", seller.bearer())
        .multipart(form)
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = resp.json().await.expect("Failed to parse product");
    body["product"].clone()
}
