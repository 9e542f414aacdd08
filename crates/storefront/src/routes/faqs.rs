//! Product FAQ handlers.
//!
//! Only the seller who owns a product may add or remove its FAQs.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

use bazaar_core::{FaqId, ProductId, UserId};

use super::products::{load_product, not_found_as_product, with_seller_details};
use super::{ApiJson, parse_id};
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::models::{Faq, Product};
use crate::state::AppState;

/// New FAQ body.
#[derive(Debug, Default, Deserialize)]
pub struct FaqInput {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// FAQ removal body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqRemoval {
    pub faq_id: Option<String>,
}

fn ensure_owner(product: &Product, seller: UserId) -> Result<(), AppError> {
    if product.is_owned_by(seller) {
        Ok(())
    } else {
        tracing::warn!(
            product_id = %product.id,
            user_id = %seller,
            "FAQ change by non-owner rejected"
        );
        Err(AppError::Unauthorized)
    }
}

/// FAQs of a product.
pub async fn index(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;
    let product = load_product(state.pool(), id).await?;
    Ok(Json(product.faqs))
}

/// Add an FAQ to a product the session seller owns.
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<FaqInput>,
) -> Result<impl IntoResponse, AppError> {
    let question = input.question.trim();
    let answer = input.answer.trim();
    if question.is_empty() || answer.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_owned()));
    }
    let id = parse_id::<ProductId>(&id, "product")?;
    let faq = Faq::new(question.to_owned(), answer.to_owned());

    let product = ProductRepository::new(state.pool())
        .modify(id, |product| {
            ensure_owner(product, seller.id)?;
            product.add_faq(faq.clone());
            Ok::<bool, AppError>(true)
        })
        .await
        .map_err(not_found_as_product)?;

    tracing::info!(product_id = %id, faq_id = %faq.id, "FAQ added");
    Ok(Json(with_seller_details(state.pool(), product).await?))
}

/// Remove an FAQ from a product the session seller owns.
///
/// Removing an id the product does not have leaves the list as it is.
pub async fn destroy(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    ApiJson(removal): ApiJson<FaqRemoval>,
) -> Result<impl IntoResponse, AppError> {
    let faq_id = removal
        .faq_id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required fields".to_owned()))?;
    let faq_id = parse_id::<FaqId>(faq_id, "FAQ")?;
    let id = parse_id::<ProductId>(&id, "product")?;

    let mut removed = false;
    let product = ProductRepository::new(state.pool())
        .modify(id, |product| {
            ensure_owner(product, seller.id)?;
            removed = product.remove_faq(faq_id);
            Ok::<bool, AppError>(removed)
        })
        .await
        .map_err(not_found_as_product)?;

    tracing::info!(product_id = %id, faq_id = %faq_id, removed, "FAQ removal processed");
    Ok(Json(with_seller_details(state.pool(), product).await?))
}
