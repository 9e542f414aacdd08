//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `bazaar`
//!
//! ## Tables
//!
//! - `user` - Buyer and seller accounts (argon2 password hashes)
//! - `product` - Listings, with reviews and FAQs embedded as JSONB arrays
//! - `purchase_order` - Orders with JSONB line items and address snapshot
//!
//! References between tables are weak (no foreign keys): deleting a product
//! does not touch the orders that mention it.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::{OrderCounts, OrderRepository};
pub use products::{ProductFilter, ProductRepository};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or a write that kept losing
    /// optimistic concurrency races.
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The row changed since it was read.
    #[error("stale version")]
    StaleVersion,
}

impl RepositoryError {
    /// Map unique-constraint violations to `Conflict`.
    pub(crate) fn on_unique_violation(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
