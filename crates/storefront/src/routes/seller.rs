//! Seller dashboard handlers.
//!
//! Mounted under `/seller`, which the role gate restricts to seller sessions.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, OrderStatus, OrderStatusError, estimated_revenue};

use super::{ApiJson, parse_id};
use crate::db::{OrderRepository, ProductFilter, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::state::AppState;

/// Seller dashboard summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDashboard {
    pub total_products: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_orders: i64,
    pub pending_orders: i64,
}

/// Status change body.
#[derive(Debug, Default, Deserialize)]
pub struct StatusChange {
    #[serde(default)]
    pub status: String,
}

/// Catalog size, revenue estimate and order counts.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
) -> Result<impl IntoResponse, AppError> {
    let filter = ProductFilter {
        seller_id: Some(seller.id),
        ..ProductFilter::default()
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    let counts = OrderRepository::new(state.pool())
        .counts_for_seller(seller.id)
        .await?;

    Ok(Json(SellerDashboard {
        total_products: products.len(),
        total_revenue: estimated_revenue(products.iter().map(|p| (p.price, p.stock))),
        total_orders: counts.total,
        pending_orders: counts.pending,
    }))
}

/// Orders received by the session seller.
pub async fn orders(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
) -> Result<impl IntoResponse, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_seller(seller.id)
        .await?;
    Ok(Json(orders))
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.trim()
        .parse::<OrderStatus>()
        .map_err(|e: OrderStatusError| AppError::BadRequest(e.to_string()))
}

/// Move one of the seller's orders to a new status.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<OrderId>(&id, "order")?;
    let next = parse_status(&change.status)?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_by_id(id)
        .await?
        .filter(|order| order.seller_id == seller.id)
        .ok_or_else(|| AppError::NotFound("Order".to_owned()))?;

    let next = order
        .status
        .transition_to(next)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let order = repo
        .update_status(id, order.status, next)
        .await
        .map_err(|e| match e {
            RepositoryError::StaleVersion => AppError::Conflict(
                "Order status changed concurrently, please retry".to_owned(),
            ),
            other => other.into(),
        })?;

    tracing::info!(order_id = %id, status = %order.status, "Order status updated");
    Ok(Json(order))
}
