//! Order repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use bazaar_core::{OrderId, OrderStatus, Price, UserId};

use super::RepositoryError;
use crate::models::order::{NewOrder, Order, OrderItem, ShippingAddress};

/// Internal row type for order queries.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    buyer_id: UserId,
    seller_id: UserId,
    items: serde_json::Value,
    total_amount: Price,
    status: OrderStatus,
    shipping_address: serde_json::Value,
    payment_method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_value(row.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid items for order {}: {e}", row.id))
        })?;
        let shipping_address: ShippingAddress = serde_json::from_value(row.shipping_address)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid shipping address for order {}: {e}",
                    row.id
                ))
            })?;

        Ok(Self {
            id: row.id,
            order_number: row.order_number,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            items,
            total_amount: row.total_amount,
            status: row.status,
            shipping_address,
            payment_method: row.payment_method,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Order counts shown on dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderCounts {
    pub total: i64,
    pub pending: i64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, buyer_id, seller_id, items, total_amount, status,
                   shipping_address, payment_method, notes, created_at, updated_at
            FROM bazaar.purchase_order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// Orders placed by a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, buyer_id, seller_id, items, total_amount, status,
                   shipping_address, payment_method, notes, created_at, updated_at
            FROM bazaar.purchase_order
            WHERE buyer_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(buyer_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Orders received by a seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(&self, seller_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, buyer_id, seller_id, items, total_amount, status,
                   shipping_address, payment_method, notes, created_at, updated_at
            FROM bazaar.purchase_order
            WHERE seller_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Total and pending order counts for a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts_for_seller(&self, seller_id: UserId) -> Result<OrderCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, OrderCounts>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM bazaar.purchase_order
            WHERE seller_id = $1
            ",
        )
        .bind(seller_id)
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Total and pending order counts for a buyer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts_for_buyer(&self, buyer_id: UserId) -> Result<OrderCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, OrderCounts>(
            r"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending
            FROM bazaar.purchase_order
            WHERE buyer_id = $1
            ",
        )
        .bind(buyer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Move an order from `from` to `to`, if it is still in `from`.
    ///
    /// Callers validate the transition first; the `from` guard makes the
    /// write fail instead of clobbering a concurrent status change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StaleVersion` if the order is no longer in
    /// `from`.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE bazaar.purchase_order
            SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING id, order_number, buyer_id, seller_id, items, total_amount, status,
                      shipping_address, payment_method, notes, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::StaleVersion), Order::try_from)
    }
}

/// Insert an order on any executor (pool or open transaction).
pub(crate) async fn insert<'e, E>(executor: E, order: &NewOrder) -> Result<Order, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let total = order
        .total_amount()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid order total: {e}")))?;

    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO bazaar.purchase_order
            (order_number, buyer_id, seller_id, items, total_amount,
             shipping_address, payment_method, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, order_number, buyer_id, seller_id, items, total_amount, status,
                  shipping_address, payment_method, notes, created_at, updated_at
        ",
    )
    .bind(NewOrder::generate_number(Utc::now()))
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(Json(&order.items))
    .bind(total)
    .bind(Json(&order.shipping_address))
    .bind(&order.payment_method)
    .bind(order.notes.as_deref())
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::on_unique_violation(e, "order number already exists"))?;

    Order::try_from(row)
}
