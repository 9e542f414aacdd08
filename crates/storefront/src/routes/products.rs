//! Product catalog route handlers.
//!
//! Listings are created from multipart forms whose `attachment_<n>` files
//! are stored inline as base64 data URIs. Updates accept either a JSON patch
//! or a multipart form that replaces the editable fields.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::{
    Json,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use bazaar_core::{Price, ProductId, Sku, UserId};

use super::{ApiJson, parse_id};
use crate::db::{ProductFilter, ProductRepository, UserRepository};
use crate::error::AppError;
use crate::middleware::RequireSeller;
use crate::models::product::{PLACEHOLDER_IMAGE, primary_image};
use crate::models::{NewProduct, Product, ProductPatch, ProductView, SellerProfile, SellerRef};
use crate::state::AppState;

const ATTACHMENT_PREFIX: &str = "attachment_";

// =============================================================================
// Seller resolution
// =============================================================================

/// Attach the seller's store and contact details to a product.
pub(crate) async fn with_seller_details(
    pool: &PgPool,
    product: Product,
) -> Result<ProductView, AppError> {
    let seller = UserRepository::new(pool)
        .get_by_id(product.seller_id)
        .await?
        .map_or(SellerRef::Id(product.seller_id), |user| {
            SellerRef::Profile(SellerProfile::full(&user))
        });
    Ok(ProductView::new(product, seller))
}

/// Attach seller name and store name to each product with one lookup.
async fn with_seller_summaries(
    pool: &PgPool,
    products: Vec<Product>,
) -> Result<Vec<ProductView>, AppError> {
    let ids: Vec<UserId> = products
        .iter()
        .map(|p| p.seller_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let sellers: HashMap<UserId, SellerProfile> = UserRepository::new(pool)
        .get_many(&ids)
        .await?
        .iter()
        .map(|user| (user.id, SellerProfile::summary(user)))
        .collect();

    Ok(products
        .into_iter()
        .map(|product| {
            let seller = sellers
                .get(&product.seller_id)
                .cloned()
                .map_or(SellerRef::Id(product.seller_id), SellerRef::Profile);
            ProductView::new(product, seller)
        })
        .collect())
}

pub(crate) async fn load_product(pool: &PgPool, id: ProductId) -> Result<Product, AppError> {
    ProductRepository::new(pool)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_owned()))
}

// =============================================================================
// Multipart forms
// =============================================================================

/// Text fields and attachments of a product form.
#[derive(Debug, Default)]
struct ProductForm {
    fields: HashMap<String, String>,
    /// Data URIs keyed by attachment index.
    attachments: BTreeMap<usize, String>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if let Some(index) = name
                .strip_prefix(ATTACHMENT_PREFIX)
                .and_then(|n| n.parse::<usize>().ok())
            {
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                form.attachments
                    .insert(index, format!("data:{mime};base64,{}", STANDARD.encode(&bytes)));
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed, non-empty value of a text field.
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn price(&self, name: &str) -> Result<Option<Price>, AppError> {
        self.text(name)
            .map(|raw| {
                Price::parse(raw).map_err(|_| AppError::BadRequest(format!("Invalid {name}")))
            })
            .transpose()
    }

    fn stock(&self) -> Result<i32, AppError> {
        let Some(raw) = self.text("stock") else {
            return Ok(0);
        };
        match raw.parse::<i32>() {
            Ok(stock) if stock >= 0 => Ok(stock),
            _ => Err(AppError::BadRequest("Invalid stock".to_owned())),
        }
    }

    fn into_attachments(self) -> Vec<String> {
        self.attachments.into_values().collect()
    }
}

fn missing_fields() -> AppError {
    AppError::BadRequest("Missing required fields".to_owned())
}

// =============================================================================
// Handlers
// =============================================================================

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub seller_id: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<ProductFilter, AppError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let seller_id = non_empty(self.seller_id)
            .map(|raw| parse_id::<UserId>(&raw, "seller"))
            .transpose()?;

        Ok(ProductFilter {
            seller_id,
            category: non_empty(self.category),
            search: non_empty(self.search),
        })
    }
}

/// Search active listings.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    let views = with_seller_summaries(state.pool(), products).await?;
    Ok(Json(views))
}

/// A single listing with full seller details.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;
    let product = load_product(state.pool(), id).await?;
    Ok(Json(with_seller_details(state.pool(), product).await?))
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    message: &'static str,
    product: ProductView,
}

/// Create a listing from a multipart form.
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = ProductForm::read(multipart).await?;

    let (Some(name), Some(description), Some(category), Some(seller_raw)) = (
        form.text("name").map(str::to_owned),
        form.text("description").map(str::to_owned),
        form.text("category").map(str::to_owned),
        form.text("sellerId"),
    ) else {
        return Err(missing_fields());
    };
    let price = form.price("price")?.ok_or_else(missing_fields)?;

    let seller_id = parse_id::<UserId>(seller_raw, "seller")?;
    if seller_id != seller.id {
        tracing::warn!(
            user_id = %seller.id,
            seller_id = %seller_id,
            "Refusing to create a listing for another seller"
        );
        return Err(AppError::Unauthorized);
    }

    let original_price = form.price("originalPrice")?;
    let stock = form.stock()?;
    let images = form.into_attachments();
    let image = primary_image(&images).unwrap_or(PLACEHOLDER_IMAGE).to_owned();

    let new_product = NewProduct {
        sku: Sku::generate(&category),
        name,
        description,
        price,
        original_price,
        category,
        image,
        images,
        stock,
        seller_id,
    };
    let product = ProductRepository::new(state.pool())
        .create(&new_product)
        .await?;

    tracing::info!(product_id = %product.id, seller_id = %seller_id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Product created successfully",
            product: ProductView::unresolved(product),
        }),
    ))
}

/// Build a full-replacement patch from a multipart edit form.
async fn patch_from_multipart(multipart: Multipart) -> Result<ProductPatch, AppError> {
    patch_from_form(ProductForm::read(multipart).await?)
}

/// Text fields are replaced outright. Images change only when the form
/// carries `existingImages` or new attachments.
fn patch_from_form(form: ProductForm) -> Result<ProductPatch, AppError> {
    let (Some(name), Some(description), Some(category)) = (
        form.text("name").map(str::to_owned),
        form.text("description").map(str::to_owned),
        form.text("category").map(str::to_owned),
    ) else {
        return Err(missing_fields());
    };
    let price = form.price("price")?.ok_or_else(missing_fields)?;
    let original_price = form.price("originalPrice")?;
    let stock = form.stock()?;

    let retained: Option<Vec<String>> = form
        .text("existingImages")
        .map(|raw| {
            serde_json::from_str(raw)
                .map_err(|_| AppError::BadRequest("Invalid existingImages".to_owned()))
        })
        .transpose()?;
    let attachments = form.into_attachments();

    let images = match retained {
        None if attachments.is_empty() => None,
        retained => {
            let mut images = retained.unwrap_or_default();
            images.extend(attachments);
            Some(images)
        }
    };
    let image = images
        .as_deref()
        .map(|images| primary_image(images).unwrap_or(PLACEHOLDER_IMAGE).to_owned());

    Ok(ProductPatch {
        name: Some(name),
        description: Some(description),
        price: Some(price),
        original_price: Some(original_price),
        category: Some(category),
        stock: Some(stock),
        image,
        images,
        is_active: None,
    })
}

/// Update a listing owned by the session seller.
pub async fn update(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let patch = if content_type.starts_with("application/json") {
        let ApiJson(patch) = ApiJson::<ProductPatch>::from_request(request, &state).await?;
        patch
    } else if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        patch_from_multipart(multipart).await?
    } else {
        return Err(AppError::BadRequest("Unsupported content type".to_owned()));
    };
    let patch = patch.validate().map_err(AppError::BadRequest)?;

    let product = ProductRepository::new(state.pool())
        .modify(id, |product| {
            if !product.is_owned_by(seller.id) {
                return Err(AppError::Unauthorized);
            }
            patch.clone().apply(product);
            Ok(true)
        })
        .await
        .map_err(not_found_as_product)?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(ProductView::unresolved(product)))
}

/// Delete a listing owned by the session seller.
pub async fn destroy(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id::<ProductId>(&id, "product")?;
    let product = load_product(state.pool(), id).await?;
    if !product.is_owned_by(seller.id) {
        return Err(AppError::Unauthorized);
    }

    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_as_product(e.into()))?;

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(
        serde_json::json!({ "message": "Product deleted successfully" }),
    ))
}

/// Name the missing resource in repository `NotFound` errors.
pub(crate) fn not_found_as_product(err: AppError) -> AppError {
    match err {
        AppError::Database(crate::db::RepositoryError::NotFound) => {
            AppError::NotFound("Product".to_owned())
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::{body::Body, http::Request as HttpRequest};
    use bazaar_core::Role;

    use super::*;
    use crate::routes::testing::{bearer, json_body, send, test_state, user};

    const BOUNDARY: &str = "X-BAZAAR-TEST";

    fn multipart_body(fields: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn multipart_request(uri: &str, token: Option<String>, fields: &[(&str, &str)]) -> HttpRequest<Body> {
        let mut builder = HttpRequest::post(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        builder.body(Body::from(multipart_body(fields))).unwrap()
    }

    #[tokio::test]
    async fn test_list_rejects_malformed_seller_id() {
        let state = test_state(false);
        let response = send(
            &state,
            HttpRequest::get("/products?sellerId=not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid seller id");
    }

    #[tokio::test]
    async fn test_show_rejects_malformed_id() {
        let state = test_state(false);
        let response = send(
            &state,
            HttpRequest::get("/products/123").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_requires_seller_session() {
        let state = test_state(false);
        let fields = [("name", "Lamp")];

        let anonymous = send(&state, multipart_request("/products", None, &fields)).await;
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let buyer = user(Role::Buyer);
        let as_buyer = send(
            &state,
            multipart_request("/products", Some(bearer(&state, &buyer)), &fields),
        )
        .await;
        assert_eq!(as_buyer.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let response = send(
            &state,
            multipart_request(
                "/products",
                Some(bearer(&state, &seller)),
                &[("name", "Lamp"), ("price", "100")],
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_price() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let seller_id = seller.id.to_string();
        let response = send(
            &state,
            multipart_request(
                "/products",
                Some(bearer(&state, &seller)),
                &[
                    ("name", "Lamp"),
                    ("description", "Warm light"),
                    ("price", "ten"),
                    ("category", "Home & Garden"),
                    ("sellerId", &seller_id),
                ],
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid price");
    }

    #[tokio::test]
    async fn test_create_for_other_seller_is_unauthorized() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let other = UserId::generate().to_string();
        let response = send(
            &state,
            multipart_request(
                "/products",
                Some(bearer(&state, &seller)),
                &[
                    ("name", "Lamp"),
                    ("description", "Warm light"),
                    ("price", "100"),
                    ("category", "Home & Garden"),
                    ("sellerId", &other),
                ],
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_rejects_unsupported_content_type() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let response = send(
            &state,
            HttpRequest::put(format!("/products/{}", ProductId::generate()))
                .header(header::AUTHORIZATION, bearer(&state, &seller))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("name=x"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Unsupported content type");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_patch() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let response = send(
            &state,
            HttpRequest::put(format!("/products/{}", ProductId::generate()))
                .header(header::AUTHORIZATION, bearer(&state, &seller))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"stock":-5}"#))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_requires_seller_session() {
        let state = test_state(false);
        let response = send(
            &state,
            HttpRequest::delete(format!("/products/{}", ProductId::generate()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_form_stock_and_price_parsing() {
        let mut form = ProductForm::default();
        assert_eq!(form.stock().unwrap(), 0);
        assert_eq!(form.price("originalPrice").unwrap(), None);

        form.fields.insert("stock".to_owned(), " 12 ".to_owned());
        form.fields.insert("price".to_owned(), "2499".to_owned());
        assert_eq!(form.stock().unwrap(), 12);
        assert_eq!(form.price("price").unwrap(), Some(Price::parse("2499").unwrap()));

        form.fields.insert("stock".to_owned(), "-1".to_owned());
        assert!(form.stock().is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_price_past_column_range() {
        let state = test_state(false);
        let seller = user(Role::Seller);
        let seller_id = seller.id.to_string();
        for price in ["99999999999", "19.999"] {
            let response = send(
                &state,
                multipart_request(
                    "/products",
                    Some(bearer(&state, &seller)),
                    &[
                        ("name", "Lamp"),
                        ("description", "Warm light"),
                        ("price", price),
                        ("category", "Home & Garden"),
                        ("sellerId", &seller_id),
                    ],
                ),
            )
            .await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "price {price}");
            assert_eq!(json_body(response).await["error"], "Invalid price");
        }
    }

    fn edit_form(extra: &[(&str, &str)]) -> ProductForm {
        let mut form = ProductForm::default();
        for (name, value) in [
            ("name", "Lamp"),
            ("description", "Warm light"),
            ("price", "100"),
            ("category", "Home & Garden"),
        ]
        .iter()
        .chain(extra)
        {
            form.fields.insert((*name).to_owned(), (*value).to_owned());
        }
        form
    }

    #[test]
    fn test_edit_without_images_keeps_existing_images() {
        let patch = patch_from_form(edit_form(&[])).unwrap();
        assert_eq!(patch.images, None);
        assert_eq!(patch.image, None);

        let mut product = crate::models::product::tests::sample_product(UserId::generate());
        product.images = vec!["headphones.jpg".to_owned()];
        let before = (product.image.clone(), product.images.clone());
        patch.apply(&mut product);
        assert_eq!((product.image, product.images), before);
    }

    #[test]
    fn test_edit_retained_images_pick_primary() {
        let patch = patch_from_form(edit_form(&[(
            "existingImages",
            r#"["data:video/mp4;base64,QQ==","data:image/png;base64,Qg=="]"#,
        )]))
        .unwrap();
        assert_eq!(patch.images.as_ref().map(Vec::len), Some(2));
        assert_eq!(patch.image.as_deref(), Some("data:image/png;base64,Qg=="));
    }

    #[test]
    fn test_edit_retaining_no_images_falls_back_to_placeholder() {
        let patch = patch_from_form(edit_form(&[("existingImages", "[]")])).unwrap();
        assert_eq!(patch.images, Some(Vec::new()));
        assert_eq!(patch.image.as_deref(), Some(PLACEHOLDER_IMAGE));

        let videos_only = patch_from_form(edit_form(&[(
            "existingImages",
            r#"["data:video/mp4;base64,QQ=="]"#,
        )]))
        .unwrap();
        assert_eq!(videos_only.image.as_deref(), Some(PLACEHOLDER_IMAGE));
    }

    #[test]
    fn test_edit_appends_attachments_after_retained() {
        let mut form = edit_form(&[("existingImages", r#"["https://cdn.example/a.png"]"#)]);
        form.attachments.insert(0, "data:image/png;base64,Qg==".to_owned());

        let patch = patch_from_form(form).unwrap();
        assert_eq!(
            patch.images,
            Some(vec![
                "https://cdn.example/a.png".to_owned(),
                "data:image/png;base64,Qg==".to_owned(),
            ])
        );
    }

    #[test]
    fn test_edit_rejects_malformed_existing_images() {
        let result = patch_from_form(edit_form(&[("existingImages", "not json")]));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_form_attachments_keep_index_order() {
        let mut form = ProductForm::default();
        form.attachments.insert(1, "data:image/png;base64,Qg==".to_owned());
        form.attachments.insert(0, "data:video/mp4;base64,QQ==".to_owned());

        let images = form.into_attachments();
        assert_eq!(images[0], "data:video/mp4;base64,QQ==");
        assert_eq!(primary_image(&images), Some("data:image/png;base64,Qg=="));
    }
}
