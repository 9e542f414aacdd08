//! Demo data bootstrap.
//!
//! Loads a demo seller, a demo buyer, eight products and one sample order in
//! a single transaction. Running it again once the demo seller exists is a
//! no-op.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{Email, Price, PriceError, Role, Sku};

use super::auth::{AuthError, hash_password};
use crate::db::{RepositoryError, orders, products, users};
use crate::models::order::{DEFAULT_PAYMENT_METHOD, NewOrder, OrderItem, ShippingAddress};
use crate::models::product::NewProduct;
use crate::models::user::NewUser;

pub const DEMO_SELLER_EMAIL: &str = "seller@demo.com";
pub const DEMO_BUYER_EMAIL: &str = "buyer@demo.com";
pub const DEMO_PASSWORD: &str = "demo123";

/// (name, description, price, original price, category, image, stock)
const DEMO_PRODUCTS: &[(&str, &str, &str, &str, &str, &str, i32)] = &[
    (
        "Wireless Headphones",
        "High-quality wireless headphones with noise cancellation and 20-hour battery life.",
        "2499",
        "4999",
        "Electronics",
        "headphones.jpg",
        50,
    ),
    (
        "USB-C Cable",
        "Fast charging USB-C cable compatible with all devices.",
        "399",
        "799",
        "Electronics",
        "cable.jpg",
        200,
    ),
    (
        "Phone Case",
        "Durable and stylish phone case with excellent protection.",
        "599",
        "1199",
        "Electronics",
        "case.jpg",
        100,
    ),
    (
        "Organic Tea Set",
        "Premium organic green tea and black tea collection.",
        "1299",
        "2499",
        "Food & Groceries",
        "tea.jpg",
        75,
    ),
    (
        "Coffee Maker",
        "Automatic coffee maker with brew strength control.",
        "3499",
        "6999",
        "Home & Garden",
        "coffee.jpg",
        30,
    ),
    (
        "Notebook Set",
        "Set of 3 premium notebooks for writing and sketching.",
        "499",
        "999",
        "Books",
        "notebook.jpg",
        150,
    ),
    (
        "T-Shirt",
        "Comfortable cotton t-shirt in multiple colors.",
        "599",
        "1299",
        "Clothing",
        "tshirt.jpg",
        200,
    ),
    (
        "Running Shoes",
        "Professional running shoes with air cushioning technology.",
        "4999",
        "9999",
        "Clothing",
        "shoes.jpg",
        40,
    ),
];

/// Errors that can occur while loading demo data.
#[derive(Debug, Error)]
pub enum DemoSeedError {
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("transaction error: {0}")]
    Transaction(#[from] sqlx::Error),

    #[error("failed to hash demo password: {0}")]
    Auth(#[from] AuthError),

    #[error("invalid demo data: {0}")]
    InvalidData(String),
}

impl From<PriceError> for DemoSeedError {
    fn from(e: PriceError) -> Self {
        Self::InvalidData(e.to_string())
    }
}

impl From<bazaar_core::EmailError> for DemoSeedError {
    fn from(e: bazaar_core::EmailError) -> Self {
        Self::InvalidData(e.to_string())
    }
}

/// Login details of a demo account.
#[derive(Debug, Clone, Serialize)]
pub struct DemoCredentials {
    pub email: String,
    pub password: String,
}

/// Result of a seeding run.
#[derive(Debug, Clone)]
pub enum SeedOutcome {
    /// Demo data was created.
    Created {
        seller: DemoCredentials,
        buyer: DemoCredentials,
        products: usize,
    },
    /// The demo seller already existed; nothing was written.
    AlreadyInitialized,
}

/// Load the demo dataset unless it is already present.
///
/// # Errors
///
/// Returns `DemoSeedError` if any insert fails; the transaction is rolled
/// back and nothing is left behind.
pub async fn seed_demo(pool: &PgPool) -> Result<SeedOutcome, DemoSeedError> {
    let seller_email = Email::parse(DEMO_SELLER_EMAIL)?;
    let buyer_email = Email::parse(DEMO_BUYER_EMAIL)?;

    let mut tx = pool.begin().await?;

    if users::find_by_email(&mut *tx, &seller_email).await?.is_some() {
        tracing::info!("Demo data already present");
        return Ok(SeedOutcome::AlreadyInitialized);
    }

    let password_hash = hash_password(DEMO_PASSWORD)?;

    let seller = NewUser {
        store_name: Some("Demo Store".to_owned()),
        store_description: Some(
            "Welcome to our demo store. We offer quality products.".to_owned(),
        ),
        phone: Some("9876543210".to_owned()),
        address: Some("Demo Street, Demo City".to_owned()),
        city: Some("Demo City".to_owned()),
        zip_code: Some("123456".to_owned()),
        ..NewUser::new(
            "Demo Seller".to_owned(),
            seller_email,
            password_hash.clone(),
            Role::Seller,
        )
    };
    let seller = match users::insert(&mut *tx, &seller).await {
        Ok(user) => user,
        // Lost a race with a concurrent seeding run.
        Err(RepositoryError::Conflict(_)) => return Ok(SeedOutcome::AlreadyInitialized),
        Err(e) => return Err(e.into()),
    };

    let buyer = NewUser {
        phone: Some("9876543211".to_owned()),
        address: Some("Buyer Street, Buyer City".to_owned()),
        city: Some("Buyer City".to_owned()),
        zip_code: Some("654321".to_owned()),
        ..NewUser::new(
            "Demo Buyer".to_owned(),
            buyer_email,
            password_hash,
            Role::Buyer,
        )
    };
    let buyer = users::insert(&mut *tx, &buyer).await?;

    let mut created = Vec::with_capacity(DEMO_PRODUCTS.len());
    for &(name, description, price, original_price, category, image, stock) in DEMO_PRODUCTS {
        let product = NewProduct {
            name: name.to_owned(),
            description: description.to_owned(),
            price: Price::parse(price)?,
            original_price: Some(Price::parse(original_price)?),
            category: category.to_owned(),
            image: image.to_owned(),
            images: Vec::new(),
            stock,
            seller_id: seller.id,
            sku: Sku::generate(category),
        };
        created.push(products::insert(&mut *tx, &product).await?);
    }

    let items: Vec<OrderItem> = created
        .iter()
        .take(2)
        .zip([1, 2])
        .map(|(product, quantity)| OrderItem {
            product_id: product.id,
            quantity,
            price: product.price,
        })
        .collect();

    let order = NewOrder {
        buyer_id: buyer.id,
        seller_id: seller.id,
        items,
        shipping_address: ShippingAddress {
            name: buyer.name.clone(),
            phone: buyer.phone.clone().unwrap_or_default(),
            address: buyer.address.clone().unwrap_or_default(),
            city: buyer.city.clone().unwrap_or_default(),
            zip_code: buyer.zip_code.clone().unwrap_or_default(),
        },
        payment_method: DEFAULT_PAYMENT_METHOD.to_owned(),
        notes: Some("Sample order created with the demo data".to_owned()),
    };
    orders::insert(&mut *tx, &order).await?;

    tx.commit().await?;

    tracing::info!(
        seller_id = %seller.id,
        buyer_id = %buyer.id,
        products = created.len(),
        "Demo data initialized"
    );

    Ok(SeedOutcome::Created {
        seller: DemoCredentials {
            email: seller.email.into_inner(),
            password: DEMO_PASSWORD.to_owned(),
        },
        buyer: DemoCredentials {
            email: buyer.email.into_inner(),
            password: DEMO_PASSWORD.to_owned(),
        },
        products: created.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_products_are_valid() {
        assert_eq!(DEMO_PRODUCTS.len(), 8);
        for &(name, _, price, original, category, _, stock) in DEMO_PRODUCTS {
            let price = Price::parse(price).unwrap();
            let original = Price::parse(original).unwrap();
            assert!(original > price, "{name} should be discounted");
            assert!(stock >= 0);
            assert!(!category.is_empty());
        }
    }

    #[test]
    fn test_demo_headphones_discount() {
        let (_, _, price, original, ..) = DEMO_PRODUCTS[0];
        assert_eq!(
            bazaar_core::discount_percent(
                Price::parse(price).unwrap(),
                Some(Price::parse(original).unwrap())
            ),
            50
        );
    }

    #[test]
    fn test_demo_emails_parse() {
        assert!(Email::parse(DEMO_SELLER_EMAIL).is_ok());
        assert!(Email::parse(DEMO_BUYER_EMAIL).is_ok());
    }
}
