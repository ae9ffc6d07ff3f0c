//! Enumeration types for constrained values.

use serde::{Deserialize, Serialize};

/// Access level of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full catalog and order management.
    Admin,
    /// Shopping and own order history only.
    Customer,
}

impl Role {
    /// Returns `true` for [`Role::Admin`].
    #[inline]
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl core::fmt::Display for Role {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Admin => f.write_str("admin"),
            Self::Customer => f.write_str("customer"),
        }
    }
}

/// Fulfillment status of an order.
///
/// Orders only ever move forward through `Pending`, `Dispatched` and
/// `Delivered`. Skipping ahead is allowed; moving back is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Placed and awaiting dispatch.
    Pending,
    /// Handed to a courier.
    Dispatched,
    /// Received by the customer. Terminal.
    Delivered,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Dispatched, Self::Delivered];

    /// Returns `true` if an order in this status may be set to `next`.
    ///
    /// Staying in place counts as allowed.
    #[inline]
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        next >= self
    }

    /// Canonical display name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Dispatched => "Dispatched",
            Self::Delivered => "Delivered",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = String;

    #[inline]
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| format!("unknown order status: {raw}"))
    }
}
