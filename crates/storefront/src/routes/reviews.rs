//! Product review handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;

use bazaar_core::{ProductId, Rating, UserId};

use super::products::{load_product, not_found_as_product, with_seller_details};
use super::{ApiJson, parse_id};
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::OptionalAuth;
use crate::models::Review;
use crate::state::AppState;

/// Author name used when neither a session nor the body names one.
const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Review submission body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub rating: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub comment: String,
}

impl ReviewInput {
    /// Check the body and settle the author.
    ///
    /// A session identity, when present, replaces whatever author the body
    /// claims.
    fn into_review(self, session: Option<(UserId, String)>) -> Result<Review, AppError> {
        let title = self.title.trim();
        let comment = self.comment.trim();
        let (Some(rating), false, false) = (self.rating, title.is_empty(), comment.is_empty())
        else {
            return Err(AppError::BadRequest("Missing required fields".to_owned()));
        };
        let rating = Rating::new(rating)
            .map_err(|_| AppError::BadRequest("Rating must be between 1 and 5".to_owned()))?;

        let (user_id, user_name) = match session {
            Some((id, name)) => (Some(id), name),
            None => {
                let user_id = self
                    .user_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
                    .map(|raw| parse_id::<UserId>(raw, "user"))
                    .transpose()?;
                let user_name = self
                    .user_name
                    .map(|n| n.trim().to_owned())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_owned());
                (user_id, user_name)
            }
        };

        Ok(Review::new(
            user_id,
            user_name,
            rating,
            title.to_owned(),
            comment.to_owned(),
        ))
    }
}

/// Reviews of a product, oldest first.
pub async fn index(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;
    let product = load_product(state.pool(), id).await?;
    Ok(Json(product.reviews))
}

/// Append a review and recompute the product rating.
pub async fn create(
    State(state): State<AppState>,
    OptionalAuth(current): OptionalAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;
    let review = input.into_review(current.map(|user| (user.id, user.name)))?;

    let product = ProductRepository::new(state.pool())
        .modify(id, |product| {
            product.add_review(review.clone());
            Ok::<bool, AppError>(true)
        })
        .await
        .map_err(not_found_as_product)?;

    tracing::info!(
        product_id = %id,
        review_id = %review.id,
        rating = %review.rating,
        "Review added"
    );

    Ok(Json(with_seller_details(state.pool(), product).await?))
}
