//! Demo data command.
//!
//! Same dataset and idempotency as `GET /init`, without needing the
//! server's demo flag.

use bazaar_storefront::services::demo::{DemoSeedError, SeedOutcome, seed_demo};
use tracing::info;

use super::{ConnectError, connect};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Demo(#[from] DemoSeedError),
}

/// Load the demo seller, buyer, catalog and sample order.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or any insert fails.
pub async fn demo() -> Result<(), SeedError> {
    let pool = connect().await?;

    match seed_demo(&pool).await? {
        SeedOutcome::Created {
            seller,
            buyer,
            products,
        } => {
            info!(
                seller = %seller.email,
                buyer = %buyer.email,
                password = %seller.password,
                products,
                "Demo data initialized"
            );
        }
        SeedOutcome::AlreadyInitialized => info!("Demo data already initialized"),
    }

    Ok(())
}
