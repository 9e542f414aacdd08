//! Non-negative decimal prices and the pricing math built on them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// More than [`MAX_SCALE`] decimal places.
    #[error("price can have at most 2 decimal places")]
    TooPrecise,
    /// At or above [`PRICE_LIMIT`].
    #[error("price must be below 10000000000")]
    TooLarge,
}

/// Decimal places a stored price keeps (`NUMERIC(12, 2)`).
pub const MAX_SCALE: u32 = 2;

/// Exclusive upper bound of a stored price (`NUMERIC(12, 2)`).
pub const PRICE_LIMIT: Decimal = Decimal::from_parts(0x540B_E400, 2, 0, false, 0); // 10_000_000_000

/// A non-negative amount in the store currency with at most two decimal
/// places, below [`PRICE_LIMIT`].
///
/// Serialized as a JSON number. Deserialization applies the same checks.
///
/// ```
/// use bazaar_core::Price;
///
/// let price = Price::parse("2499").unwrap();
/// assert_eq!(price.to_string(), "2499");
/// assert!(Price::parse("-1").is_err());
/// assert!(Price::parse("cheap").is_err());
/// assert!(Price::parse("19.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero,
    /// `TooPrecise` past two decimal places and `TooLarge` at or above
    /// [`PRICE_LIMIT`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let amount = amount.normalize();
        if amount.scale() > MAX_SCALE {
            return Err(PriceError::TooPrecise);
        }
        if amount >= PRICE_LIMIT {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }

    /// Parse a price from text such as a multipart form field.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a decimal or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s.trim().parse().map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Whole-number discount percentage of `price` relative to `original`.
///
/// Zero when there is no original price or it does not exceed the current
/// price. Halves round away from zero.
///
/// ```
/// use bazaar_core::{Price, discount_percent};
///
/// let price = Price::parse("2499").unwrap();
/// let original = Price::parse("4999").unwrap();
/// assert_eq!(discount_percent(price, Some(original)), 50);
/// assert_eq!(discount_percent(price, None), 0);
/// ```
#[must_use]
pub fn discount_percent(price: Price, original: Option<Price>) -> u32 {
    let Some(original) = original else {
        return 0;
    };
    if original.0 <= price.0 {
        return 0;
    }

    let ratio = (original.0 - price.0) / original.0 * Decimal::ONE_HUNDRED;
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Revenue estimate for a seller's catalog: ten percent of stock value.
///
/// Sums `price * stock * 0.1` over the listings, rounded to two places.
#[must_use]
pub fn estimated_revenue<I>(listings: I) -> Decimal
where
    I: IntoIterator<Item = (Price, i32)>,
{
    let tenth = Decimal::new(1, 1);
    listings
        .into_iter()
        .map(|(price, stock)| price.0 * Decimal::from(stock.max(0)) * tenth)
        .sum::<Decimal>()
        .round_dp(2)
        .normalize()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(p("19.99").amount(), Decimal::new(1999, 2));
        assert_eq!(p(" 0 "), Price::ZERO);
        assert_eq!(Price::parse("-0.01"), Err(PriceError::Negative));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_rejects_extra_decimal_places() {
        assert_eq!(p("19.990").amount(), Decimal::new(1999, 2));
        assert_eq!(Price::parse("19.999"), Err(PriceError::TooPrecise));
        assert_eq!(Price::parse("0.001"), Err(PriceError::TooPrecise));
        assert!(serde_json::from_str::<Price>("19.999").is_err());
    }

    #[test]
    fn test_rejects_amounts_past_column_range() {
        assert_eq!(p("9999999999.99").amount(), Decimal::new(999_999_999_999, 2));
        assert_eq!(Price::parse("10000000000"), Err(PriceError::TooLarge));
        assert_eq!(Price::parse("99999999999"), Err(PriceError::TooLarge));
    }

    #[test]
    fn test_serializes_as_number() {
        assert_eq!(serde_json::to_string(&p("1299")).unwrap(), "1299.0");
        let price: Price = serde_json::from_str("399").unwrap();
        assert_eq!(price, p("399"));
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(discount_percent(p("399"), Some(p("799"))), 50);
        assert_eq!(discount_percent(p("75"), Some(p("100"))), 25);
        // 1 - 2/3 = 33.33..%
        assert_eq!(discount_percent(p("2"), Some(p("3"))), 33);
        // 0.5% rounds up
        assert_eq!(discount_percent(p("199"), Some(p("200"))), 1);
    }

    #[test]
    fn test_discount_zero_when_not_discounted() {
        assert_eq!(discount_percent(p("100"), None), 0);
        assert_eq!(discount_percent(p("100"), Some(p("100"))), 0);
        assert_eq!(discount_percent(p("100"), Some(p("80"))), 0);
    }

    #[test]
    fn test_estimated_revenue() {
        let revenue = estimated_revenue([(p("2499"), 50), (p("399"), 200)]);
        assert_eq!(revenue, Decimal::new(204_750, 1));
        assert_eq!(estimated_revenue(Vec::new()), Decimal::ZERO);
    }
}
