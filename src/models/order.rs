//! Placed order model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CartLine, OrderId, OrderStatus, UserId};
use crate::error::{Result, StorefrontError};

/// Where and to whom an order is delivered.
///
/// Every field is free text and must be non-blank at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    /// Person receiving the order.
    pub recipient_name: String,
    /// Contact phone number.
    pub phone: String,
    /// General location or street address.
    pub location: String,
    /// Building or apartment name.
    pub building: String,
    /// Door or unit number.
    pub door: String,
}

impl DeliveryDetails {
    /// Returns a trimmed copy, or the first blank field as an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Validation`] naming the first blank field.
    #[inline]
    pub fn validated(&self) -> Result<Self> {
        let fields = [
            ("recipient name", &self.recipient_name),
            ("phone", &self.phone),
            ("location", &self.location),
            ("building", &self.building),
            ("door", &self.door),
        ];
        if let Some(&(field, _)) = fields.iter().find(|&&(_, value)| value.trim().is_empty()) {
            return Err(StorefrontError::validation(field, "is required"));
        }
        Ok(Self {
            recipient_name: self.recipient_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            location: self.location.trim().to_owned(),
            building: self.building.trim().to_owned(),
            door: self.door.trim().to_owned(),
        })
    }
}

/// A checked-out order.
///
/// Items and money fields are frozen at checkout; only `status` changes
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier.
    pub id: OrderId,
    /// ID of the user who placed the order.
    pub owner_id: UserId,
    /// Identifier of the user who placed the order.
    pub owner: String,
    /// Snapshot of the cart lines at checkout.
    pub items: Vec<CartLine>,
    /// Sum of the line totals.
    pub subtotal: u64,
    /// Delivery fee charged on this order.
    pub delivery_fee: u64,
    /// `subtotal + delivery_fee`.
    pub total: u64,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Checkout time.
    pub created_at: DateTime<Utc>,
    /// Delivery address and contact.
    pub delivery: DeliveryDetails,
}

impl Order {
    /// Total number of units in the order.
    #[inline]
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }
}
