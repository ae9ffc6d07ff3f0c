//! Catalog product model and the raw input used to create or edit one.

use serde::{Deserialize, Serialize};

use super::ProductId;
use crate::error::{Result, StorefrontError};

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price in whole currency units.
    pub price: u64,
    /// Shelf category.
    pub category: String,
    /// Units on hand. Informational only; checkout never decrements it.
    pub stock: u64,
    /// Decorative icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Brand or product type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

/// Unvalidated product fields, as typed into the admin form.
///
/// Price and stock arrive as text and are coerced to non-negative integers
/// by [`ProductDraft::into_product`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    /// Display name (required).
    pub name: String,
    /// Unit price (required, whole number).
    pub price: String,
    /// Shelf category (required).
    pub category: String,
    /// Units on hand (required, whole number).
    pub stock: String,
    /// Optional icon.
    pub emoji: Option<String>,
    /// Optional brand or type.
    pub brand: Option<String>,
}

impl ProductDraft {
    /// Creates a draft from the four required fields.
    #[inline]
    #[must_use]
    pub fn new<N, P, C, S>(name: N, price: P, category: C, stock: S) -> Self
    where
        N: Into<String>,
        P: Into<String>,
        C: Into<String>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            price: price.into(),
            category: category.into(),
            stock: stock.into(),
            emoji: None,
            brand: None,
        }
    }

    /// Sets the icon.
    #[inline]
    #[must_use]
    pub fn emoji<T: Into<String>>(mut self, emoji: T) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Sets the brand.
    #[inline]
    #[must_use]
    pub fn brand<T: Into<String>>(mut self, brand: T) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Validates the draft and builds a product with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Validation`] if the name or category is
    /// blank, or if price or stock is not a non-negative whole number.
    #[inline]
    pub fn into_product(self, id: ProductId) -> Result<Product> {
        Ok(Product {
            id,
            name: required_text("name", &self.name)?,
            price: whole_number("price", &self.price)?,
            category: required_text("category", &self.category)?,
            stock: whole_number("stock", &self.stock)?,
            emoji: optional_text(self.emoji),
            brand: optional_text(self.brand),
        })
    }
}

/// Partial update of a product. Fields left as `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement price (whole number).
    pub price: Option<String>,
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement stock count (whole number).
    pub stock: Option<String>,
    /// Replacement icon; a blank value clears it.
    pub emoji: Option<String>,
    /// Replacement brand; a blank value clears it.
    pub brand: Option<String>,
}

impl ProductPatch {
    /// Creates an empty patch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the name.
    #[inline]
    #[must_use]
    pub fn name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the price.
    #[inline]
    #[must_use]
    pub fn price<T: Into<String>>(mut self, price: T) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Replaces the category.
    #[inline]
    #[must_use]
    pub fn category<T: Into<String>>(mut self, category: T) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replaces the stock count.
    #[inline]
    #[must_use]
    pub fn stock<T: Into<String>>(mut self, stock: T) -> Self {
        self.stock = Some(stock.into());
        self
    }

    /// Replaces the icon.
    #[inline]
    #[must_use]
    pub fn emoji<T: Into<String>>(mut self, emoji: T) -> Self {
        self.emoji = Some(emoji.into());
        self
    }

    /// Replaces the brand.
    #[inline]
    #[must_use]
    pub fn brand<T: Into<String>>(mut self, brand: T) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Applies the patch to `product`, returning the edited copy.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Validation`] under the same rules as
    /// [`ProductDraft::into_product`], for every field present.
    #[inline]
    pub fn apply_to(&self, product: &Product) -> Result<Product> {
        let mut edited = product.clone();
        if let Some(name) = self.name.as_deref() {
            edited.name = required_text("name", name)?;
        }
        if let Some(price) = self.price.as_deref() {
            edited.price = whole_number("price", price)?;
        }
        if let Some(category) = self.category.as_deref() {
            edited.category = required_text("category", category)?;
        }
        if let Some(stock) = self.stock.as_deref() {
            edited.stock = whole_number("stock", stock)?;
        }
        if let Some(emoji) = self.emoji.as_ref() {
            edited.emoji = optional_text(Some(emoji.clone()));
        }
        if let Some(brand) = self.brand.as_ref() {
            edited.brand = optional_text(Some(brand.clone()));
        }
        Ok(edited)
    }
}

/// Trims `raw` and rejects it if nothing is left.
fn required_text(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorefrontError::validation(field, "is required"));
    }
    Ok(trimmed.to_owned())
}

/// Parses a non-negative whole number.
fn whole_number(field: &'static str, raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorefrontError::validation(field, "is required"));
    }
    trimmed.parse::<u64>().map_err(|err| {
        StorefrontError::validation(
            field,
            format!("`{trimmed}` is not a non-negative whole number ({err})"),
        )
    })
}

/// Trims an optional value, treating blank as absent.
fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
