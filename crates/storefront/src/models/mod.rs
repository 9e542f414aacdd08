//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. Types that appear on the wire serialize with camelCase
//! keys.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{NewOrder, Order, OrderItem, ShippingAddress};
pub use product::{
    Faq, NewProduct, Product, ProductPatch, ProductView, Review, SellerProfile, SellerRef,
};
pub use session::CurrentUser;
pub use user::{NewUser, ProfileUpdate, User};
