//! Order types.
//!
//! Orders hold weak references to their buyer, seller and products. Line
//! items and the shipping address are snapshots taken when the order is
//! placed and are stored as JSONB.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderId, OrderStatus, Price, PriceError, ProductId, UserId};

/// Payment method recorded when none is given.
pub const DEFAULT_PAYMENT_METHOD: &str = "cod";

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the time of ordering.
    pub price: Price,
}

/// Delivery address snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

/// A placed order (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Sum of unit price times quantity over all lines.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the total cannot be represented as a price.
    pub fn total_amount(&self) -> Result<Price, PriceError> {
        let total: Decimal = self
            .items
            .iter()
            .map(|item| item.price.amount() * Decimal::from(item.quantity))
            .sum();
        Price::new(total)
    }

    /// Human-facing order number, e.g. `ORD-20250101-1A2B3C4D`.
    #[must_use]
    pub fn generate_number(now: DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "ORD-{}-{}",
            now.format("%Y%m%d"),
            suffix.get(..8).unwrap_or(&suffix).to_uppercase()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(price: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: ProductId::generate(),
            quantity,
            price: Price::parse(price).unwrap(),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Demo Buyer".to_owned(),
            phone: "9876543211".to_owned(),
            address: "Buyer Street, Buyer City".to_owned(),
            city: "Buyer City".to_owned(),
            zip_code: "654321".to_owned(),
        }
    }

    #[test]
    fn test_total_amount() {
        let order = NewOrder {
            buyer_id: UserId::generate(),
            seller_id: UserId::generate(),
            items: vec![item("2499", 1), item("399", 2)],
            shipping_address: address(),
            payment_method: DEFAULT_PAYMENT_METHOD.to_owned(),
            notes: None,
        };
        assert_eq!(order.total_amount().unwrap(), Price::parse("3297").unwrap());
    }

    #[test]
    fn test_generate_number() {
        let now = "2025-03-04T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let number = NewOrder::generate_number(now);
        assert!(number.starts_with("ORD-20250304-"));
        assert_eq!(number.len(), "ORD-20250304-".len() + 8);
        assert_ne!(number, NewOrder::generate_number(now));
    }

    #[test]
    fn test_shipping_address_camel_case() {
        let json = serde_json::to_value(address()).unwrap();
        assert_eq!(json["zipCode"], "654321");
    }
}
