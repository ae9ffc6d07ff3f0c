//! Order ledger: checkout, status workflow and revenue.
//!
//! Orders are kept newest first. Each order freezes its line items and
//! money fields at checkout; only the status moves afterwards, and only
//! forward along `Pending -> Dispatched -> Delivered`.

use chrono::{DateTime, Utc};

use crate::error::{Result, StorefrontError};
use crate::identity::require_admin;
use crate::models::{Cart, DeliveryDetails, Order, OrderId, OrderStatus, User};

/// Every placed order, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderLedger {
    /// Orders, newest first.
    orders: Vec<Order>,
}

impl OrderLedger {
    /// Wraps a loaded order list (expected newest first).
    #[inline]
    #[must_use]
    pub const fn from_orders(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Every order, newest first.
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[Order] {
        &self.orders
    }

    /// Looks up an order by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    /// Turns the cart into a `Pending` order owned by `owner`.
    ///
    /// The cart itself is not touched; clearing it is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::EmptyCart`] if the cart has no lines, then
    /// [`StorefrontError::Validation`] if any delivery field is blank.
    #[tracing::instrument(skip_all, fields(owner = %owner.identifier))]
    pub fn checkout(
        &mut self,
        owner: &User,
        cart: &Cart,
        delivery: &DeliveryDetails,
        delivery_fee: u64,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        if cart.is_empty() {
            tracing::warn!("checkout with empty cart");
            return Err(StorefrontError::EmptyCart);
        }
        let delivery = delivery.validated()?;
        let subtotal = cart.subtotal();
        let order = Order {
            id: OrderId::next(now, self.orders.iter().map(|order| order.id)),
            owner_id: owner.id,
            owner: owner.identifier.clone(),
            items: cart.lines().to_vec(),
            subtotal,
            delivery_fee,
            total: cart.total(delivery_fee),
            status: OrderStatus::Pending,
            created_at: now,
            delivery,
        };
        self.orders.insert(0, order.clone());
        tracing::info!(id = %order.id, total = order.total, "order placed");
        Ok(order)
    }

    /// Moves an order to `status`.
    ///
    /// Forward moves may skip a step. Asking for the current status is a
    /// no-op that returns the order unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless `actor` is an admin,
    /// [`StorefrontError::NotFound`] for an unknown ID, or
    /// [`StorefrontError::InvalidTransition`] for a backward move.
    #[tracing::instrument(skip_all, fields(id = %id, to = %status))]
    pub fn set_status(
        &mut self,
        actor: Option<&User>,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        let _admin = require_admin(actor)?;
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| StorefrontError::not_found("order", id))?;
        if !order.status.can_transition_to(status) {
            tracing::warn!(from = %order.status, "backward status change refused");
            return Err(StorefrontError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }
        if order.status != status {
            tracing::info!(from = %order.status, "order status changed");
            order.status = status;
        }
        Ok(order.clone())
    }

    /// Orders `viewer` may see: everything for admins, only their own for
    /// customers, nothing without a session.
    #[inline]
    #[must_use]
    pub fn list_for_viewer(&self, viewer: Option<&User>) -> Vec<&Order> {
        match viewer {
            Some(user) if user.is_admin() => self.orders.iter().collect(),
            Some(user) => self
                .orders
                .iter()
                .filter(|order| order.owner == user.identifier)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sum of `total` over orders in `status`.
    #[inline]
    #[must_use]
    pub fn revenue(&self, status: OrderStatus) -> u64 {
        self.orders
            .iter()
            .filter(|order| order.status == status)
            .fold(0_u64, |sum, order| sum.saturating_add(order.total))
    }

    /// Revenue from delivered orders, the dashboard headline figure.
    #[inline]
    #[must_use]
    pub fn delivered_revenue(&self) -> u64 {
        self.revenue(OrderStatus::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Product, ProductId, Role, UserId};

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn user(id: i64, identifier: &str, role: Role) -> User {
        User {
            id: UserId::new(id),
            identifier: identifier.to_owned(),
            password: "pw".to_owned(),
            role,
        }
    }

    fn bread() -> Product {
        Product {
            id: ProductId::new(2),
            name: "Bread (500g)".to_owned(),
            price: 65,
            category: "Bakery".to_owned(),
            stock: 20,
            emoji: None,
            brand: None,
        }
    }

    fn delivery() -> DeliveryDetails {
        DeliveryDetails {
            recipient_name: "Jane".to_owned(),
            phone: "0700000000".to_owned(),
            location: "Westlands".to_owned(),
            building: "Sunrise Apts".to_owned(),
            door: "4B".to_owned(),
        }
    }

    fn two_breads() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(&bread());
        cart.add_line(&bread());
        cart
    }

    #[test]
    fn checkout_builds_pending_order() {
        let mut ledger = OrderLedger::default();
        let jane = user(10, "jane", Role::Customer);
        let order = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(5_000))
            .unwrap();
        assert_eq!(order.subtotal, 130);
        assert_eq!(order.delivery_fee, 100);
        assert_eq!(order.total, 230);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.owner, "jane");
        assert_eq!(order.owner_id, jane.id);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(ledger.all(), &[order]);
    }

    #[test]
    fn empty_cart_is_checked_before_delivery() {
        let mut ledger = OrderLedger::default();
        let jane = user(10, "jane", Role::Customer);
        let err = ledger
            .checkout(&jane, &Cart::new(), &DeliveryDetails::default(), 100, at(1))
            .unwrap_err();
        assert!(matches!(err, StorefrontError::EmptyCart));
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn blank_delivery_field_rejected() {
        let mut ledger = OrderLedger::default();
        let jane = user(10, "jane", Role::Customer);
        let details = DeliveryDetails {
            door: "  ".to_owned(),
            ..delivery()
        };
        let err = ledger
            .checkout(&jane, &two_breads(), &details, 100, at(1))
            .unwrap_err();
        assert!(matches!(err, StorefrontError::Validation { field: "door", .. }));
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn newest_order_first_with_unique_ids() {
        let mut ledger = OrderLedger::default();
        let jane = user(10, "jane", Role::Customer);
        let first = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(7_000))
            .unwrap();
        let second = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(7_000))
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(ledger.all()[0].id, second.id);
    }

    #[test]
    fn status_moves_forward_and_skips() {
        let mut ledger = OrderLedger::default();
        let admin = user(1, "boss", Role::Admin);
        let jane = user(10, "jane", Role::Customer);
        let order = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(1))
            .unwrap();

        let delivered = ledger
            .set_status(Some(&admin), order.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        let again = ledger
            .set_status(Some(&admin), order.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(again, delivered);
    }

    #[test]
    fn backward_status_rejected() {
        let mut ledger = OrderLedger::default();
        let admin = user(1, "boss", Role::Admin);
        let jane = user(10, "jane", Role::Customer);
        let order = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(1))
            .unwrap();
        let _dispatched = ledger
            .set_status(Some(&admin), order.id, OrderStatus::Dispatched)
            .unwrap();
        let err = ledger
            .set_status(Some(&admin), order.id, OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(
            err,
            StorefrontError::InvalidTransition {
                from: OrderStatus::Dispatched,
                to: OrderStatus::Pending,
            }
        ));
        assert_eq!(ledger.get(order.id).unwrap().status, OrderStatus::Dispatched);
    }

    #[test]
    fn status_change_requires_admin_and_known_id() {
        let mut ledger = OrderLedger::default();
        let admin = user(1, "boss", Role::Admin);
        let jane = user(10, "jane", Role::Customer);
        let order = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(1))
            .unwrap();
        assert!(matches!(
            ledger.set_status(Some(&jane), order.id, OrderStatus::Delivered),
            Err(StorefrontError::Unauthorized { .. })
        ));
        assert!(matches!(
            ledger.set_status(Some(&admin), OrderId::new(404), OrderStatus::Delivered),
            Err(StorefrontError::NotFound { entity: "order", .. })
        ));
        assert_eq!(ledger.get(order.id).unwrap().status, OrderStatus::Pending);
    }

    #[test]
    fn visibility_follows_role() {
        let mut ledger = OrderLedger::default();
        let admin = user(1, "boss", Role::Admin);
        let jane = user(10, "jane", Role::Customer);
        let tom = user(11, "tom", Role::Customer);
        let _jane_order = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(1))
            .unwrap();
        let _tom_order = ledger
            .checkout(&tom, &two_breads(), &delivery(), 100, at(2))
            .unwrap();

        assert_eq!(ledger.list_for_viewer(Some(&admin)).len(), 2);
        let visible = ledger.list_for_viewer(Some(&jane));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].owner, "jane");
        assert!(ledger.list_for_viewer(None).is_empty());
    }

    #[test]
    fn revenue_counts_only_matching_status() {
        let mut ledger = OrderLedger::default();
        let admin = user(1, "boss", Role::Admin);
        let jane = user(10, "jane", Role::Customer);
        let first = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(1))
            .unwrap();
        let _second = ledger
            .checkout(&jane, &two_breads(), &delivery(), 100, at(2))
            .unwrap();
        assert_eq!(ledger.delivered_revenue(), 0);
        assert_eq!(ledger.revenue(OrderStatus::Pending), 460);

        let _delivered = ledger
            .set_status(Some(&admin), first.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(ledger.delivered_revenue(), 230);
        assert_eq!(ledger.revenue(OrderStatus::Pending), 230);
    }
}
