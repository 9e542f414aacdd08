//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod rating;
pub mod role;
pub mod sku;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, discount_percent, estimated_revenue};
pub use rating::{Rating, RatingError, average_rating};
pub use role::{Role, RoleError};
pub use sku::Sku;
pub use status::{OrderStatus, OrderStatusError};
