//! Shopping cart for the active session.

use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// One cart row: a frozen copy of the product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product snapshot taken when the line was first added.
    pub product: Product,
    /// Units of the product; always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Price times quantity.
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.product.price.saturating_mul(u64::from(self.quantity))
    }
}

/// Quantity-aggregated cart: at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    /// Lines in the order they were first added.
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one unit of `product`.
    ///
    /// An existing line for the same product ID has its quantity bumped;
    /// otherwise a new line with quantity 1 is appended.
    #[inline]
    pub fn add_line(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }
        self.lines.push(CartLine {
            product: product.clone(),
            quantity: 1,
        });
    }

    /// Removes every line.
    #[inline]
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Current lines.
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns `true` when the cart has no lines.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[inline]
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Sum of price times quantity over all lines.
    #[inline]
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        self.lines
            .iter()
            .fold(0, |acc: u64, line| acc.saturating_add(line.line_total()))
    }

    /// Subtotal plus the given delivery fee.
    #[inline]
    #[must_use]
    pub fn total(&self, delivery_fee: u64) -> u64 {
        self.subtotal().saturating_add(delivery_fee)
    }

    /// Drops lines with a zero quantity, returning how many were removed.
    #[inline]
    pub fn drop_empty_lines(&mut self) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| line.quantity > 0);
        before.saturating_sub(self.lines.len())
    }

    /// Finds the line for `id`.
    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == id)
    }
}
