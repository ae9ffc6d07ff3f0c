//! Product catalog.

use chrono::{DateTime, Utc};

use crate::error::{Result, StorefrontError};
use crate::identity::require_admin;
use crate::models::{Product, ProductDraft, ProductId, ProductPatch, User};

/// Demo fixture loaded by [`Catalog::seed`]: name, price, category, stock,
/// icon.
const SEED: [(&str, u64, &str, u64, &str); 7] = [
    ("Maize Flour (Unga 1kg)", 130, "Grains", 50, "🌽"),
    ("Bread (500g)", 65, "Bakery", 20, "🍞"),
    ("Milk (Fresh 1L)", 130, "Dairy", 30, "🥛"),
    ("Eggs (12 Pack)", 230, "Poultry", 20, "🥚"),
    ("Sukuma Wiki (1kg)", 70, "Vegetables", 60, "🥬"),
    ("Mandazi", 10, "Snacks", 100, "🍩"),
    ("Matchbox", 15, "Household", 200, "🔥"),
];

/// The list of products for sale, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Products in the order they were added.
    products: Vec<Product>,
}

impl Catalog {
    /// Wraps a loaded product list.
    #[inline]
    #[must_use]
    pub const fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Every product, in insertion order.
    #[inline]
    #[must_use]
    pub fn list(&self) -> &[Product] {
        &self.products
    }

    /// Looks up a product by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Validates `draft` and appends it under a fresh ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin,
    /// or [`StorefrontError::Validation`] if the draft is invalid.
    #[tracing::instrument(skip_all)]
    pub fn add(
        &mut self,
        actor: Option<&User>,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> Result<Product> {
        let _admin = require_admin(actor)?;
        let id = ProductId::next(now, self.products.iter().map(|product| product.id));
        let product = draft.into_product(id)?;
        self.products.push(product.clone());
        tracing::info!(id = %product.id, name = %product.name, "product added");
        Ok(product)
    }

    /// Applies `patch` to the product with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin,
    /// [`StorefrontError::NotFound`] for an unknown ID, or
    /// [`StorefrontError::Validation`] if a patched field is invalid.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub fn update(
        &mut self,
        actor: Option<&User>,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product> {
        let _admin = require_admin(actor)?;
        let slot = self
            .products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or_else(|| StorefrontError::not_found("product", id))?;
        let edited = patch.apply_to(slot)?;
        slot.clone_from(&edited);
        tracing::info!(name = %edited.name, "product updated");
        Ok(edited)
    }

    /// Removes the product with the given ID.
    ///
    /// Carts and orders keep their own snapshots, so nothing else changes.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin,
    /// or [`StorefrontError::NotFound`] for an unknown ID.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub fn remove(&mut self, actor: Option<&User>, id: ProductId) -> Result<Product> {
        let _admin = require_admin(actor)?;
        let index = self
            .products
            .iter()
            .position(|product| product.id == id)
            .ok_or_else(|| StorefrontError::not_found("product", id))?;
        let removed = self.products.remove(index);
        tracing::info!(name = %removed.name, "product removed");
        Ok(removed)
    }

    /// Replaces the catalog with the seven-item demo fixture (IDs 1 to 7).
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin.
    #[tracing::instrument(skip_all)]
    pub fn seed(&mut self, actor: Option<&User>) -> Result<&[Product]> {
        let _admin = require_admin(actor)?;
        self.products = seed_products();
        tracing::info!(count = self.products.len(), "catalog seeded");
        Ok(&self.products)
    }
}

/// Builds the demo fixture.
fn seed_products() -> Vec<Product> {
    SEED.iter()
        .zip(1_i64..)
        .map(|(&(name, price, category, stock, emoji), id)| Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            price,
            category: category.to_owned(),
            stock,
            emoji: Some(emoji.to_owned()),
            brand: None,
        })
        .collect()
}
