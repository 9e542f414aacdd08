//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// Error returned for unknown status names or illegal transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderStatusError {
    /// The string is not a known status.
    #[error("invalid order status: {0}")]
    Unknown(String),
    /// The requested transition is not allowed.
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// Order fulfillment status.
///
/// Orders move forward `pending → confirmed → shipped → delivered`. Any
/// non-terminal order can be cancelled. `delivered` and `cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bazaar.order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Lowercase wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an order in this status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (current, Self::Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Validate a transition to `next`, returning `next` on success.
    ///
    /// # Errors
    ///
    /// Returns `OrderStatusError::IllegalTransition` if the move is not allowed.
    pub const fn transition_to(self, next: Self) -> Result<Self, OrderStatusError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderStatusError::IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderStatusError::Unknown(other.to_owned())),
        }
    }
}
