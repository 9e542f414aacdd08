//! Product repository for database operations.
//!
//! Every write to an existing product is guarded by its `version` column.
//! [`ProductRepository::modify`] wraps read-modify-write sequences (review
//! append, FAQ edits, field updates) in a bounded retry loop so concurrent
//! writers never silently overwrite each other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use bazaar_core::{Price, ProductId, Sku, UserId};

use super::RepositoryError;
use crate::models::product::{Faq, NewProduct, Product, Review};

/// Attempts made by [`ProductRepository::modify`] before giving up.
pub const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Internal row type for product queries.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
    original_price: Option<Price>,
    category: String,
    image: String,
    images: Vec<String>,
    stock: i32,
    seller_id: UserId,
    rating: Decimal,
    reviews: serde_json::Value,
    faqs: serde_json::Value,
    sku: String,
    is_active: bool,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let reviews: Vec<Review> = serde_json::from_value(row.reviews).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid reviews for product {}: {e}", row.id))
        })?;
        let faqs: Vec<Faq> = serde_json::from_value(row.faqs).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid faqs for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            original_price: row.original_price,
            category: row.category,
            image: row.image,
            images: row.images,
            stock: row.stock,
            seller_id: row.seller_id,
            rating: row.rating,
            reviews,
            faqs,
            sku: Sku::from_existing(row.sku),
            is_active: row.is_active,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Catalog search filters. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub seller_id: Option<UserId>,
    pub category: Option<String>,
    /// Case-insensitive literal substring of the name or description.
    pub search: Option<String>,
}

/// Escape `LIKE` metacharacters so `term` matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, original_price, category, image, images,
                   stock, seller_id, rating, reviews, faqs, sku, is_active, version,
                   created_at, updated_at
            FROM bazaar.product
            WHERE is_active
              AND ($1::uuid IS NULL OR seller_id = $1)
              AND ($2::text IS NULL OR category = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR description ILIKE $3)
            ORDER BY created_at DESC
            ",
        )
        .bind(filter.seller_id)
        .bind(filter.category.as_deref())
        .bind(search)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, price, original_price, category, image, images,
                   stock, seller_id, rating, reviews, faqs, sku, is_active, version,
                   created_at, updated_at
            FROM bazaar.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a new listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        insert(self.pool, product).await
    }

    /// Write back a product read earlier, if nobody else wrote it since.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StaleVersion` if the stored version no
    /// longer matches `product.version` (or the row is gone).
    pub async fn save(&self, product: &Product) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE bazaar.product
            SET name = $3,
                description = $4,
                price = $5,
                original_price = $6,
                category = $7,
                image = $8,
                images = $9,
                stock = $10,
                rating = $11,
                reviews = $12,
                faqs = $13,
                is_active = $14,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING id, name, description, price, original_price, category, image, images,
                      stock, seller_id, rating, reviews, faqs, sku, is_active, version,
                      created_at, updated_at
            ",
        )
        .bind(product.id)
        .bind(product.version)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.category)
        .bind(&product.image)
        .bind(&product.images)
        .bind(product.stock)
        .bind(product.rating)
        .bind(Json(&product.reviews))
        .bind(Json(&product.faqs))
        .bind(product.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::StaleVersion), Product::try_from)
    }

    /// Read, change and save a product, retrying on concurrent writes.
    ///
    /// `change` runs against a fresh copy on every attempt. It returns
    /// whether it changed anything; `false` skips the write and hands back
    /// the product as read. An error vetoes the write and is passed through
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, `Conflict` once
    /// [`MAX_UPDATE_ATTEMPTS`] writes have lost the race, or whatever
    /// `change` returns.
    pub async fn modify<F, E>(&self, id: ProductId, change: F) -> Result<Product, E>
    where
        F: FnMut(&mut Product) -> Result<bool, E>,
        E: From<RepositoryError>,
    {
        modify_versioned(self, id, change).await
    }

    /// Delete a product. Orders that reference it are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Versioned product storage, as seen by the retry loop.
trait VersionedProducts {
    async fn load(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn store(&self, product: &Product) -> Result<Product, RepositoryError>;
}

impl VersionedProducts for ProductRepository<'_> {
    async fn load(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.get_by_id(id).await
    }

    async fn store(&self, product: &Product) -> Result<Product, RepositoryError> {
        self.save(product).await
    }
}

async fn modify_versioned<S, F, E>(store: &S, id: ProductId, mut change: F) -> Result<Product, E>
where
    S: VersionedProducts,
    F: FnMut(&mut Product) -> Result<bool, E>,
    E: From<RepositoryError>,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let mut product = store.load(id).await?.ok_or(RepositoryError::NotFound)?;

        if !change(&mut product)? {
            return Ok(product);
        }

        match store.store(&product).await {
            Ok(saved) => return Ok(saved),
            Err(RepositoryError::StaleVersion) => {
                tracing::debug!(product_id = %id, attempt, "Product changed concurrently, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::warn!(product_id = %id, "Giving up on contended product update");
    Err(RepositoryError::Conflict("product was modified concurrently, please retry".to_owned()).into())
}

/// Insert a listing on any executor (pool or open transaction).
pub(crate) async fn insert<'e, E>(executor: E, product: &NewProduct) -> Result<Product, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        r"
        INSERT INTO bazaar.product
            (name, description, price, original_price, category, image, images,
             stock, seller_id, sku)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, name, description, price, original_price, category, image, images,
                  stock, seller_id, rating, reviews, faqs, sku, is_active, version,
                  created_at, updated_at
        ",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.original_price)
    .bind(&product.category)
    .bind(&product.image)
    .bind(&product.images)
    .bind(product.stock)
    .bind(product.seller_id)
    .bind(product.sku.as_str())
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::on_unique_violation(e, "sku already exists"))?;

    Product::try_from(row)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::product::tests::sample_product;

    /// In-memory store that loses the first `stale_saves` writes to a
    /// concurrent writer who bumps the stock.
    struct ContendedStore {
        product: Mutex<Product>,
        stale_saves: Mutex<usize>,
        writes: Mutex<usize>,
    }

    impl ContendedStore {
        fn new(stale_saves: usize) -> Self {
            Self {
                product: Mutex::new(sample_product(UserId::generate())),
                stale_saves: Mutex::new(stale_saves),
                writes: Mutex::new(0),
            }
        }

        fn id(&self) -> ProductId {
            self.product.lock().unwrap().id
        }
    }

    impl VersionedProducts for ContendedStore {
        async fn load(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
            let product = self.product.lock().unwrap();
            Ok((product.id == id).then(|| product.clone()))
        }

        async fn store(&self, product: &Product) -> Result<Product, RepositoryError> {
            let mut stored = self.product.lock().unwrap();
            let mut stale = self.stale_saves.lock().unwrap();
            if *stale > 0 {
                *stale -= 1;
                stored.stock += 1;
                stored.version += 1;
            }
            if stored.version != product.version {
                return Err(RepositoryError::StaleVersion);
            }
            *self.writes.lock().unwrap() += 1;
            *stored = product.clone();
            stored.version += 1;
            Ok(stored.clone())
        }
    }

    fn rename(product: &mut Product) -> Result<bool, RepositoryError> {
        product.name = "Renamed".to_owned();
        Ok(true)
    }

    #[tokio::test]
    async fn test_modify_retries_after_stale_version() {
        let store = ContendedStore::new(MAX_UPDATE_ATTEMPTS - 1);
        let stock_before = store.product.lock().unwrap().stock;

        let mut attempts = 0;
        let saved = modify_versioned(&store, store.id(), |product| {
            attempts += 1;
            rename(product)
        })
        .await
        .unwrap();

        assert_eq!(attempts, MAX_UPDATE_ATTEMPTS);
        assert_eq!(saved.name, "Renamed");
        // The concurrent writers' changes survive the retry.
        assert_eq!(saved.stock, stock_before + 2);
        assert_eq!(*store.writes.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_modify_gives_up_with_conflict() {
        let store = ContendedStore::new(MAX_UPDATE_ATTEMPTS);

        let result = modify_versioned(&store, store.id(), rename).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(*store.writes.lock().unwrap(), 0);
        assert_ne!(store.product.lock().unwrap().name, "Renamed");
    }

    #[tokio::test]
    async fn test_modify_skips_write_without_change() {
        let store = ContendedStore::new(0);
        let version = store.product.lock().unwrap().version;

        let product = modify_versioned(&store, store.id(), |_| Ok::<_, RepositoryError>(false))
            .await
            .unwrap();

        assert_eq!(product.version, version);
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_modify_unknown_product_is_not_found() {
        let store = ContendedStore::new(0);
        let result = modify_versioned(&store, ProductId::generate(), rename).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_modify_veto_leaves_product_untouched() {
        let store = ContendedStore::new(0);
        let result = modify_versioned(&store, store.id(), |_| {
            Err::<bool, _>(RepositoryError::Conflict("vetoed".to_owned()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*store.writes.lock().unwrap(), 0);
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn test_like_pattern_keeps_regex_syntax_literal() {
        assert_eq!(like_pattern(".*(["), "%.*([%");
    }
}
