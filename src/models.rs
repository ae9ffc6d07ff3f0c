//! Data models for storefront entities.
//!
//! This module contains strongly-typed representations of users, products,
//! carts and orders, newtype ID wrappers, and enumeration types for
//! constrained values.

mod bundle;
mod cart;
mod enums;
mod ids;
mod order;
mod product;
mod user;

pub use bundle::{ExportBundle, ImportBundle, ImportSummary};
pub use cart::{Cart, CartLine};
pub use enums::{OrderStatus, Role};
pub use ids::{OrderId, ProductId, UserId};
pub use order::{DeliveryDetails, Order};
pub use product::{Product, ProductDraft, ProductPatch};
pub use user::{User, normalize_identifier};
