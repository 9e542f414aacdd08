//! Stock keeping units.

use serde::{Deserialize, Serialize};

/// Unique product code of the form `<CATEGORY>-<32 hex digits>`.
///
/// The category prefix is uppercased with every run of non-alphanumeric
/// characters collapsed to a single `-`.
///
/// ```
/// use bazaar_core::Sku;
///
/// let sku = Sku::generate("Food & Groceries");
/// assert!(sku.as_str().starts_with("FOOD-GROCERIES-"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct Sku(String);

impl Sku {
    const FALLBACK_PREFIX: &'static str = "ITEM";

    /// Generate a fresh SKU for a product in `category`.
    #[must_use]
    pub fn generate(category: &str) -> Self {
        let mut prefix = Self::slug(category);
        if prefix.is_empty() {
            prefix.push_str(Self::FALLBACK_PREFIX);
        }
        Self(format!("{prefix}-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Wrap an existing SKU read from storage.
    #[must_use]
    pub const fn from_existing(sku: String) -> Self {
        Self(sku)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn slug(category: &str) -> String {
        let mut out = String::with_capacity(category.len());
        for ch in category.chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_uppercase());
            } else if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        }
        while out.ends_with('-') {
            out.pop();
        }
        out
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(Sku::slug("Electronics"), "ELECTRONICS");
        assert_eq!(Sku::slug("Home & Garden"), "HOME-GARDEN");
        assert_eq!(Sku::slug("  --books-- "), "BOOKS");
        assert_eq!(Sku::slug("!!!"), "");
    }

    #[test]
    fn test_generate_shape() {
        let sku = Sku::generate("Clothing");
        let (prefix, suffix) = sku.as_str().split_once('-').unwrap_or_default();
        assert_eq!(prefix, "CLOTHING");
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_falls_back_for_symbol_only_category() {
        assert!(Sku::generate("&&").as_str().starts_with("ITEM-"));
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(Sku::generate("Books"), Sku::generate("Books"));
    }
}
