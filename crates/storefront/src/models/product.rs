//! Product catalog types.
//!
//! Reviews and FAQs are embedded in their product and persisted with it as
//! JSONB documents, so their serde form is also their storage form.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use bazaar_core::{
    FaqId, Price, ProductId, Rating, ReviewId, Sku, UserId, average_rating, discount_percent,
};

use super::user::User;

/// Image used when a product is listed without any image attachment.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x300?text=Product";

/// A buyer review embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub user_name: String,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    #[serde(default)]
    pub helpful: u32,
    pub created_at: DateTime<Utc>,
}

impl Review {
    #[must_use]
    pub fn new(
        user_id: Option<UserId>,
        user_name: String,
        rating: Rating,
        title: String,
        comment: String,
    ) -> Self {
        Self {
            id: ReviewId::generate(),
            user_id,
            user_name,
            rating,
            title,
            comment,
            helpful: 0,
            created_at: Utc::now(),
        }
    }
}

/// A seller-authored question and answer embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub helpful: u32,
    pub created_at: DateTime<Utc>,
}

impl Faq {
    #[must_use]
    pub fn new(question: String, answer: String) -> Self {
        Self {
            id: FaqId::generate(),
            question,
            answer,
            helpful: 0,
            created_at: Utc::now(),
        }
    }
}

/// A catalog listing (domain type).
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub category: String,
    pub image: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub seller_id: UserId,
    pub rating: Decimal,
    pub reviews: Vec<Review>,
    pub faqs: Vec<Faq>,
    pub sku: Sku,
    pub is_active: bool,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn discount_percent(&self) -> u32 {
        discount_percent(self.price, self.original_price)
    }

    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.seller_id == user
    }

    /// Append a review and recompute the average rating.
    pub fn add_review(&mut self, review: Review) {
        self.reviews.push(review);
        self.recompute_rating();
    }

    pub fn recompute_rating(&mut self) {
        let ratings: Vec<Rating> = self.reviews.iter().map(|r| r.rating).collect();
        self.rating = average_rating(&ratings);
    }

    pub fn add_faq(&mut self, faq: Faq) {
        self.faqs.push(faq);
    }

    /// Remove the FAQ with `id`. Returns whether anything was removed.
    pub fn remove_faq(&mut self, id: FaqId) -> bool {
        let before = self.faqs.len();
        self.faqs.retain(|faq| faq.id != id);
        self.faqs.len() != before
    }
}

/// Data required to insert a new listing.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub category: String,
    pub image: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub seller_id: UserId,
    pub sku: Sku,
}

/// Whether an image entry holds a picture rather than another media type.
///
/// Data URIs are classified by their declared MIME type; plain URLs are
/// assumed to point at images.
#[must_use]
pub fn is_image_entry(entry: &str) -> bool {
    entry
        .strip_prefix("data:")
        .is_none_or(|rest| rest.starts_with("image/"))
}

/// First image-typed entry of an attachment list.
#[must_use]
pub fn primary_image(images: &[String]) -> Option<&str> {
    images
        .iter()
        .map(String::as_str)
        .find(|entry| is_image_entry(entry))
}

/// Partial product update.
///
/// Absent fields are left unchanged. `originalPrice: null` clears the
/// original price.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    #[serde(default, deserialize_with = "double_option")]
    pub original_price: Option<Option<Price>>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ProductPatch {
    /// Trim text fields and reject blank or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(mut self) -> Result<Self, String> {
        for (field, value) in [
            ("name", &mut self.name),
            ("description", &mut self.description),
            ("category", &mut self.category),
        ] {
            if let Some(v) = value.as_mut() {
                *v = v.trim().to_owned();
                if v.is_empty() {
                    return Err(format!("{field} cannot be empty"));
                }
            }
        }

        if self.stock.is_some_and(|stock| stock < 0) {
            return Err("stock cannot be negative".to_owned());
        }

        if self.image.as_deref().is_some_and(str::is_empty) {
            return Err("image cannot be empty".to_owned());
        }

        Ok(self)
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.original_price.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.image.is_none()
            && self.images.is_none()
            && self.is_active.is_none()
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(original_price) = self.original_price {
            product.original_price = original_price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
    }
}

/// Seller details embedded in a product response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    pub id: UserId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl SellerProfile {
    /// Name and store only, as shown in listings.
    #[must_use]
    pub fn summary(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            store_name: user.store_name.clone(),
            store_description: None,
            phone: None,
            address: None,
            city: None,
        }
    }

    /// Store and contact details, as shown on a product page.
    #[must_use]
    pub fn full(user: &User) -> Self {
        Self {
            store_description: user.store_description.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            city: user.city.clone(),
            ..Self::summary(user)
        }
    }
}

/// The `sellerId` field of a product response: a bare id, or the seller's
/// profile when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SellerRef {
    Id(UserId),
    Profile(SellerProfile),
}

/// Product as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub discount_percent: u32,
    pub category: String,
    pub image: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub seller_id: SellerRef,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    pub reviews: Vec<Review>,
    pub faqs: Vec<Faq>,
    pub sku: Sku,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: Product, seller: SellerRef) -> Self {
        Self {
            discount_percent: product.discount_percent(),
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            original_price: product.original_price,
            category: product.category,
            image: product.image,
            images: product.images,
            stock: product.stock,
            seller_id: seller,
            rating: product.rating,
            reviews: product.reviews,
            faqs: product.faqs,
            sku: product.sku,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }

    /// View with the seller left as a bare id.
    #[must_use]
    pub fn unresolved(product: Product) -> Self {
        let seller = SellerRef::Id(product.seller_id);
        Self::new(product, seller)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product(seller_id: UserId) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Wireless Headphones".to_owned(),
            description: "Noise cancelling".to_owned(),
            price: Price::parse("2499").unwrap(),
            original_price: Some(Price::parse("4999").unwrap()),
            category: "Electronics".to_owned(),
            image: "headphones.jpg".to_owned(),
            images: Vec::new(),
            stock: 50,
            seller_id,
            rating: Decimal::ZERO,
            reviews: Vec::new(),
            faqs: Vec::new(),
            sku: Sku::generate("Electronics"),
            is_active: true,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn review(stars: i64) -> Review {
        Review::new(
            None,
            "Anonymous".to_owned(),
            Rating::new(stars).unwrap(),
            "Title".to_owned(),
            "Comment".to_owned(),
        )
    }

    #[test]
    fn test_add_review_recomputes_rating() {
        let mut product = sample_product(UserId::generate());
        product.add_review(review(5));
        assert_eq!(product.rating, Decimal::from(5));
        product.add_review(review(4));
        product.add_review(review(4));
        assert_eq!(product.rating, Decimal::new(43, 1));
        assert_eq!(product.reviews.len(), 3);
    }

    #[test]
    fn test_remove_faq() {
        let mut product = sample_product(UserId::generate());
        let keep = Faq::new("Warranty?".to_owned(), "One year".to_owned());
        let drop = Faq::new("Colors?".to_owned(), "Black".to_owned());
        let drop_id = drop.id;
        product.add_faq(keep.clone());
        product.add_faq(drop);

        assert!(product.remove_faq(drop_id));
        assert_eq!(product.faqs, vec![keep]);
        assert!(!product.remove_faq(FaqId::generate()));
        assert_eq!(product.faqs.len(), 1);
    }

    #[test]
    fn test_primary_image() {
        let images = vec![
            "data:video/mp4;base64,AAAA".to_owned(),
            "data:image/png;base64,BBBB".to_owned(),
        ];
        assert_eq!(primary_image(&images), Some("data:image/png;base64,BBBB"));
        assert_eq!(primary_image(&images[..1]), None);
        assert!(is_image_entry("https://cdn.example.org/shoe.jpg"));
    }

    #[test]
    fn test_patch_original_price_tristate() {
        let absent: ProductPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.original_price, None);

        let cleared: ProductPatch = serde_json::from_str(r#"{"originalPrice":null}"#).unwrap();
        assert_eq!(cleared.original_price, Some(None));

        let set: ProductPatch = serde_json::from_str(r#"{"originalPrice":999}"#).unwrap();
        assert_eq!(set.original_price, Some(Some(Price::parse("999").unwrap())));
    }

    #[test]
    fn test_patch_apply_and_validate() {
        let mut product = sample_product(UserId::generate());
        let patch: ProductPatch =
            serde_json::from_str(r#"{"name":"  Studio Headphones ","originalPrice":null,"stock":7}"#)
                .unwrap();
        patch.validate().unwrap().apply(&mut product);

        assert_eq!(product.name, "Studio Headphones");
        assert_eq!(product.original_price, None);
        assert_eq!(product.stock, 7);
        assert_eq!(product.category, "Electronics");

        let bad: ProductPatch = serde_json::from_str(r#"{"stock":-1}"#).unwrap();
        assert!(bad.validate().is_err());
        let blank: ProductPatch = serde_json::from_str(r#"{"name":"  "}"#).unwrap();
        assert!(blank.validate().is_err());
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_patch_rejects_negative_price() {
        assert!(serde_json::from_str::<ProductPatch>(r#"{"price":-10}"#).is_err());
    }

    #[test]
    fn test_view_serialization() {
        let seller = UserId::generate();
        let view = ProductView::unresolved(sample_product(seller));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["discountPercent"], 50);
        assert_eq!(json["sellerId"], seller.to_string());
        assert_eq!(json["price"], 2499.0);
        assert_eq!(json["rating"], 0.0);
        assert_eq!(json["isActive"], true);
        assert!(json["reviews"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_view_with_seller_profile() {
        let seller = UserId::generate();
        let profile = SellerProfile {
            id: seller,
            name: "Demo Seller".to_owned(),
            store_name: Some("Demo Store".to_owned()),
            store_description: None,
            phone: None,
            address: None,
            city: None,
        };
        let view = ProductView::new(sample_product(seller), SellerRef::Profile(profile));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["sellerId"]["name"], "Demo Seller");
        assert_eq!(json["sellerId"]["storeName"], "Demo Store");
        assert!(json["sellerId"].get("phone").is_none());
    }
}
