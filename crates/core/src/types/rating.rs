//! Review ratings.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Error returned for a rating outside `1..=5`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct RatingError(pub i64);

/// A review score from 1 to 5 stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a star count.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` if `value` is outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError(value))
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mean of `ratings` rounded to one decimal place, or zero when empty.
///
/// ```
/// use bazaar_core::{Rating, average_rating};
/// use rust_decimal::Decimal;
///
/// let ratings = [Rating::new(5).unwrap(), Rating::new(4).unwrap()];
/// assert_eq!(average_rating(&ratings), Decimal::new(45, 1));
/// ```
#[must_use]
pub fn average_rating(ratings: &[Rating]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }

    let total: Decimal = ratings.iter().map(|r| Decimal::from(r.0)).sum();
    (total / Decimal::from(ratings.len()))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
