//! High-level storefront with integrated persistence.
//!
//! [`Storefront`] is the composition root: it owns the identity registry,
//! catalog, cart, order ledger and view controller, and writes every
//! changed entity through a [`PersistedStore`]. A mutation is staged on a
//! copy of the affected component, the copy is saved, and only then does it
//! replace the live state, so a failed save leaves memory untouched.
//! Entities are saved independently of each other.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};
use crate::identity::{IdentityRegistry, require_admin, require_user};
use crate::ledger::OrderLedger;
use crate::models::{
    Cart, CartLine, DeliveryDetails, ExportBundle, ImportBundle, ImportSummary, Order, OrderId,
    OrderStatus, Product, ProductDraft, ProductId, ProductPatch, User,
};
use crate::storage::{Storage, StorageKey};
use crate::store::PersistedStore;
use crate::view::{Notice, Screen, ViewController};

/// Source of the current time.
pub type Clock = fn() -> DateTime<Utc>;

/// Builder for constructing a [`Storefront`].
#[derive(Debug)]
pub struct StorefrontBuilder<S: Storage> {
    /// Storage backend.
    storage: Option<S>,
    /// Runtime configuration.
    config: Option<StorefrontConfig>,
    /// Clock override.
    clock: Clock,
}

impl<S: Storage> StorefrontBuilder<S> {
    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the runtime configuration. Defaults apply when omitted.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: StorefrontConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the clock used for IDs, timestamps and notice expiry.
    #[inline]
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Loads every entity from storage and builds the storefront.
    ///
    /// Missing or corrupt entities start from their empty defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Storage`] if no storage was provided.
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<Storefront<S>> {
        let storage = self
            .storage
            .ok_or_else(|| StorefrontError::Storage("storage backend is required".into()))?;
        let config = self.config.unwrap_or_default();
        let store = PersistedStore::new(storage);

        let identity = IdentityRegistry::from_parts(
            store.load(StorageKey::Users, Vec::new()),
            store.load(StorageKey::Session, None),
        );
        let catalog = Catalog::from_products(store.load(StorageKey::Products, Vec::new()));
        let ledger = OrderLedger::from_orders(store.load(StorageKey::Orders, Vec::new()));
        let signed_in = identity.current_user().is_some();
        let mut cart = if signed_in {
            store.load(StorageKey::Cart, Cart::new())
        } else {
            Cart::new()
        };
        let dropped = cart.drop_empty_lines();
        if dropped > 0 {
            tracing::warn!(dropped, "ignoring stored cart lines with zero quantity");
        }
        let view = ViewController::new(signed_in, config.ttl());

        tracing::debug!(
            users = identity.users().len(),
            products = catalog.list().len(),
            orders = ledger.all().len(),
            signed_in,
            "storefront loaded"
        );
        Ok(Storefront {
            store,
            config,
            clock: self.clock,
            identity,
            catalog,
            cart,
            ledger,
            view,
        })
    }
}

/// Storefront state bound to a storage backend.
///
/// Use [`Storefront::builder()`] to construct an instance.
///
/// # Examples
///
/// ```
/// use freshmart::storage::InMemoryStorage;
/// use freshmart::storefront::Storefront;
/// use freshmart::models::ProductId;
///
/// let mut shop = Storefront::builder()
///     .storage(InMemoryStorage::new())
///     .build()
///     .unwrap();
/// shop.register("owner", "secret", None).unwrap();
/// shop.seed_catalog().unwrap();
/// shop.add_to_cart(ProductId::new(2)).unwrap();
/// assert_eq!(shop.cart_subtotal(), 65);
/// ```
#[derive(Debug)]
pub struct Storefront<S: Storage> {
    /// Typed persistence.
    store: PersistedStore<S>,
    /// Runtime configuration.
    config: StorefrontConfig,
    /// Time source.
    clock: Clock,
    /// Accounts and session.
    identity: IdentityRegistry,
    /// Products for sale.
    catalog: Catalog,
    /// Cart of the signed-in user.
    cart: Cart,
    /// Placed orders.
    ledger: OrderLedger,
    /// Screen and notice state.
    view: ViewController,
}

impl<S: Storage> Storefront<S> {
    /// Creates a new builder for configuring the storefront.
    #[inline]
    #[must_use]
    pub const fn builder() -> StorefrontBuilder<S> {
        StorefrontBuilder {
            storage: None,
            config: None,
            clock: Utc::now,
        }
    }

    /// The active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The storage backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        self.store.storage()
    }

    /// Consumes the storefront and returns its storage backend.
    #[inline]
    #[must_use]
    pub fn into_storage(self) -> S {
        self.store.into_storage()
    }

    // ── Identity ────────────────────────────────────────────────────

    /// Registers a new account and signs it in.
    ///
    /// `admin_secret` is compared against the PIN under
    /// [`crate::config::RolePolicy::SecretPin`] and ignored otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Validation`] or
    /// [`StorefrontError::DuplicateIdentifier`] for rejected input, and
    /// storage errors if the account cannot be saved.
    #[tracing::instrument(skip_all)]
    pub fn register(
        &mut self,
        identifier: &str,
        password: &str,
        admin_secret: Option<&str>,
    ) -> Result<User> {
        let now = self.now();
        let mut staged = self.identity.clone();
        let user = staged.register(identifier, password, admin_secret, self.config.policy(), now)?;
        self.commit_identity(staged)?;
        let _screen = self.view.navigate(Screen::Shop, Some(&user), now);
        self.view
            .notify(format!("Welcome to FreshMart, {}!", user.identifier), now);
        Ok(user)
    }

    /// Signs in with an identifier and password.
    ///
    /// Switching to a different user empties the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::InvalidCredentials`] on mismatch, and
    /// storage errors if the session cannot be saved.
    #[tracing::instrument(skip_all)]
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User> {
        let now = self.now();
        let mut staged = self.identity.clone();
        let user = staged.login(identifier, password)?;
        self.commit_identity(staged)?;
        let _screen = self.view.navigate(Screen::Shop, Some(&user), now);
        self.view
            .notify(format!("Welcome back, {}!", user.identifier), now);
        Ok(user)
    }

    /// Signs out and empties the cart.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the session cannot be saved.
    #[tracing::instrument(skip_all)]
    pub fn logout(&mut self) -> Result<()> {
        let now = self.now();
        let mut staged = self.identity.clone();
        staged.logout();
        self.commit_identity(staged)?;
        self.discard_cart();
        let _screen = self.view.navigate(Screen::Login, None, now);
        self.view.notify("Signed out", now);
        Ok(())
    }

    /// The signed-in user, if any.
    #[inline]
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.identity.current_user()
    }

    /// Creates another admin account. The session is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an
    /// admin, validation errors for the new account, and storage errors.
    #[tracing::instrument(skip_all)]
    pub fn add_admin(&mut self, identifier: &str, password: &str) -> Result<User> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.identity.clone();
        let user = staged.add_admin(actor.as_ref(), identifier, password, now)?;
        self.commit_identity(staged)?;
        self.view
            .notify(format!("Admin {} added", user.identifier), now);
        Ok(user)
    }

    /// Every registered account.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an admin.
    #[inline]
    pub fn users(&self) -> Result<&[User]> {
        let _admin = require_admin(self.identity.current_user())?;
        Ok(self.identity.users())
    }

    // ── Catalog ─────────────────────────────────────────────────────

    /// Every product, in insertion order.
    #[inline]
    #[must_use]
    pub fn products(&self) -> &[Product] {
        self.catalog.list()
    }

    /// Looks up a product by ID.
    #[inline]
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.catalog.get(id)
    }

    /// Adds a product from raw form input.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an
    /// admin, [`StorefrontError::Validation`] for bad input, and storage
    /// errors.
    #[tracing::instrument(skip_all)]
    pub fn add_product(&mut self, draft: ProductDraft) -> Result<Product> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.catalog.clone();
        let product = staged.add(actor.as_ref(), draft, now)?;
        self.commit_catalog(staged)?;
        self.view.notify(format!("{} added", product.name), now);
        Ok(product)
    }

    /// Edits a product.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`],
    /// [`StorefrontError::NotFound`], [`StorefrontError::Validation`], or a
    /// storage error.
    #[tracing::instrument(skip_all)]
    pub fn update_product(&mut self, id: ProductId, patch: &ProductPatch) -> Result<Product> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.catalog.clone();
        let product = staged.update(actor.as_ref(), id, patch)?;
        self.commit_catalog(staged)?;
        self.view.notify(format!("{} updated", product.name), now);
        Ok(product)
    }

    /// Deletes a product. Existing cart lines and orders keep their
    /// snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`],
    /// [`StorefrontError::NotFound`], or a storage error.
    #[tracing::instrument(skip_all)]
    pub fn remove_product(&mut self, id: ProductId) -> Result<Product> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.catalog.clone();
        let product = staged.remove(actor.as_ref(), id)?;
        self.commit_catalog(staged)?;
        self.view.notify(format!("{} removed", product.name), now);
        Ok(product)
    }

    /// Replaces the catalog with the demo fixture and returns its size.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] or a storage error.
    #[tracing::instrument(skip_all)]
    pub fn seed_catalog(&mut self) -> Result<usize> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.catalog.clone();
        let count = staged.seed(actor.as_ref())?.len();
        self.commit_catalog(staged)?;
        self.view.notify("Demo catalog loaded", now);
        Ok(count)
    }

    // ── Cart ────────────────────────────────────────────────────────

    /// Adds one unit of a catalog product to the cart and returns its line.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] without a session,
    /// [`StorefrontError::NotFound`] for an unknown product, or a storage
    /// error.
    #[tracing::instrument(skip_all, fields(id = %id))]
    pub fn add_to_cart(&mut self, id: ProductId) -> Result<CartLine> {
        let now = self.now();
        let actor = self.actor();
        let _user = require_user(actor.as_ref())?;
        let product = self
            .catalog
            .get(id)
            .ok_or_else(|| StorefrontError::not_found("product", id))?;
        let mut staged = self.cart.clone();
        staged.add_line(product);
        let line = staged
            .lines()
            .iter()
            .find(|line| line.product.id == id)
            .cloned()
            .ok_or_else(|| StorefrontError::not_found("cart line", id))?;
        self.store.save(StorageKey::Cart, &staged)?;
        self.cart = staged;
        tracing::debug!(quantity = line.quantity, "added to cart");
        self.view
            .notify(format!("Added {} to cart", line.product.name), now);
        Ok(line)
    }

    /// The current cart.
    #[inline]
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the empty cart cannot be saved.
    #[tracing::instrument(skip_all)]
    pub fn clear_cart(&mut self) -> Result<()> {
        let empty = Cart::new();
        self.store.save(StorageKey::Cart, &empty)?;
        self.cart = empty;
        Ok(())
    }

    /// Sum of the cart's line totals.
    #[inline]
    #[must_use]
    pub fn cart_subtotal(&self) -> u64 {
        self.cart.subtotal()
    }

    /// Subtotal plus the configured delivery fee.
    #[inline]
    #[must_use]
    pub fn cart_total(&self) -> u64 {
        self.cart.total(self.config.delivery_fee_amount())
    }

    // ── Orders ──────────────────────────────────────────────────────

    /// Places an order for the cart and empties it.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] without a session,
    /// [`StorefrontError::EmptyCart`], [`StorefrontError::Validation`] for a
    /// blank delivery field, or a storage error if the order cannot be saved.
    #[tracing::instrument(skip_all)]
    pub fn checkout(&mut self, delivery: &DeliveryDetails) -> Result<Order> {
        let now = self.now();
        let actor = self.actor();
        let owner = require_user(actor.as_ref())?;
        let mut staged = self.ledger.clone();
        let order = staged.checkout(
            owner,
            &self.cart,
            delivery,
            self.config.delivery_fee_amount(),
            now,
        )?;
        self.store.save(StorageKey::Orders, staged.all())?;
        self.ledger = staged;
        self.discard_cart();
        let _screen = self.view.navigate(Screen::Orders, Some(owner), now);
        self.view
            .notify(format!("Order #{} placed", order.id), now);
        Ok(order)
    }

    /// Moves an order forward in its workflow.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`],
    /// [`StorefrontError::NotFound`], [`StorefrontError::InvalidTransition`],
    /// or a storage error.
    #[tracing::instrument(skip_all)]
    pub fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let now = self.now();
        let actor = self.actor();
        let mut staged = self.ledger.clone();
        let order = staged.set_status(actor.as_ref(), id, status)?;
        if staged != self.ledger {
            self.store.save(StorageKey::Orders, staged.all())?;
            self.ledger = staged;
        }
        self.view
            .notify(format!("Order #{} is {}", order.id, order.status), now);
        Ok(order)
    }

    /// Orders the signed-in user may see, newest first.
    #[inline]
    #[must_use]
    pub fn visible_orders(&self) -> Vec<&Order> {
        self.ledger.list_for_viewer(self.identity.current_user())
    }

    /// Looks up one order the signed-in user may see.
    ///
    /// Admins see every order and customers only their own; nothing is
    /// visible without a session.
    #[inline]
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        let viewer = self.identity.current_user()?;
        self.ledger
            .get(id)
            .filter(|order| viewer.is_admin() || order.owner == viewer.identifier)
    }

    /// Revenue from orders in `status`.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an admin.
    #[inline]
    pub fn revenue(&self, status: OrderStatus) -> Result<u64> {
        let _admin = require_admin(self.identity.current_user())?;
        Ok(self.ledger.revenue(status))
    }

    /// Revenue from delivered orders, the dashboard headline figure.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an admin.
    #[inline]
    pub fn delivered_revenue(&self) -> Result<u64> {
        let _admin = require_admin(self.identity.current_user())?;
        Ok(self.ledger.delivered_revenue())
    }

    // ── Export / import ─────────────────────────────────────────────

    /// Serializes products, orders and users as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an
    /// admin, or a serialization error.
    #[tracing::instrument(skip_all)]
    pub fn export(&self) -> Result<String> {
        let _admin = require_admin(self.identity.current_user())?;
        let bundle = ExportBundle {
            products: self.catalog.list().to_vec(),
            orders: self.ledger.all().to_vec(),
            users: self.identity.users().to_vec(),
        };
        let json = serde_json::to_string_pretty(&bundle)?;
        tracing::info!(
            products = bundle.products.len(),
            orders = bundle.orders.len(),
            users = bundle.users.len(),
            "exported"
        );
        Ok(json)
    }

    /// Replaces collections from an exported JSON document.
    ///
    /// The whole document is parsed before anything changes. Each present
    /// key then replaces its collection and is saved on its own. If the
    /// signed-in user is missing from an imported user list, the session
    /// ends.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::Unauthorized`] unless signed in as an
    /// admin, [`StorefrontError::MalformedImport`] if the document does not
    /// parse (nothing is changed), or a storage error. A storage error
    /// leaves collections saved before the failure replaced.
    #[tracing::instrument(skip_all)]
    pub fn import(&mut self, json: &str) -> Result<ImportSummary> {
        let now = self.now();
        let _admin = require_admin(self.identity.current_user())?;
        let bundle = ImportBundle::parse(json).inspect_err(|err| {
            tracing::warn!(error = %err, "import rejected");
        })?;

        let mut summary = ImportSummary::default();
        if let Some(products) = bundle.products {
            summary.products = Some(products.len());
            self.commit_catalog(Catalog::from_products(products))?;
        }
        if let Some(orders) = bundle.orders {
            summary.orders = Some(orders.len());
            let staged = OrderLedger::from_orders(orders);
            self.store.save(StorageKey::Orders, staged.all())?;
            self.ledger = staged;
        }
        if let Some(users) = bundle.users {
            summary.users = Some(users.len());
            let mut staged = self.identity.clone();
            staged.replace_users(users);
            self.commit_identity(staged)?;
            if self.identity.current_user().is_none() {
                self.discard_cart();
                let _screen = self.view.navigate(Screen::Login, None, now);
            }
        }

        tracing::info!(
            products = ?summary.products,
            orders = ?summary.orders,
            users = ?summary.users,
            "imported"
        );
        self.view.notify("Data imported", now);
        Ok(summary)
    }

    // ── View ────────────────────────────────────────────────────────

    /// Routes to `target` and returns the screen actually shown.
    #[inline]
    pub fn navigate(&mut self, target: Screen) -> Screen {
        let now = self.now();
        self.view
            .navigate(target, self.identity.current_user(), now)
    }

    /// Screen being shown.
    #[inline]
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.view.screen()
    }

    /// The current notice, if it has not expired.
    #[inline]
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice_at(self.now())
    }

    /// The notice as of `now`.
    #[inline]
    #[must_use]
    pub fn notice_at(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.view.active_notice(now)
    }

    // ── Persistence ─────────────────────────────────────────────────

    /// Writes every entity to storage.
    ///
    /// # Errors
    ///
    /// Returns the first storage or serialization error encountered.
    #[tracing::instrument(skip_all)]
    pub fn flush(&self) -> Result<()> {
        self.store.save(StorageKey::Users, self.identity.users())?;
        self.store.save(StorageKey::Session, &self.identity.session())?;
        self.store.save(StorageKey::Products, self.catalog.list())?;
        self.store.save(StorageKey::Cart, &self.cart)?;
        self.store.save(StorageKey::Orders, self.ledger.all())?;
        tracing::debug!("flushed all entities");
        Ok(())
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Current time from the configured clock.
    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Owned copy of the signed-in user.
    fn actor(&self) -> Option<User> {
        self.identity.current_user().cloned()
    }

    /// Saves the parts of `staged` that differ, then makes it live.
    ///
    /// A changed session empties the cart.
    fn commit_identity(&mut self, staged: IdentityRegistry) -> Result<()> {
        if staged.users() != self.identity.users() {
            self.store.save(StorageKey::Users, staged.users())?;
        }
        let switched = staged.session() != self.identity.session();
        if switched {
            self.store.save(StorageKey::Session, &staged.session())?;
        }
        self.identity = staged;
        if switched {
            self.discard_cart();
        }
        Ok(())
    }

    /// Saves `staged` as the catalog, then makes it live.
    fn commit_catalog(&mut self, staged: Catalog) -> Result<()> {
        self.store.save(StorageKey::Products, staged.list())?;
        self.catalog = staged;
        Ok(())
    }

    /// Empties the cart after a session change or checkout.
    ///
    /// The owning operation has already been saved, so a failure here is
    /// logged and left for the next [`Self::flush`].
    fn discard_cart(&mut self) {
        if self.cart.is_empty() {
            return;
        }
        self.cart.clear();
        if let Err(err) = self.store.save(StorageKey::Cart, &self.cart) {
            tracing::warn!(error = %err, "failed to save emptied cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RolePolicy;
    use crate::storage::InMemoryStorage;
    use chrono::TimeDelta;
    use core::sync::atomic::{AtomicBool, Ordering};

    /// Fixed test time.
    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_000).unwrap_or_default()
    }

    fn at_offset(millis: i64) -> DateTime<Utc> {
        fixed_now() + TimeDelta::milliseconds(millis)
    }

    /// In-memory backend whose writes can be switched to fail.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        /// Real storage behind the switch.
        inner: InMemoryStorage,
        /// When set, every write fails.
        fail_writes: AtomicBool,
    }

    impl FlakyStorage {
        fn break_writes(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorefrontError::Storage("write refused".into()));
            }
            Ok(())
        }
    }

    impl Storage for FlakyStorage {
        fn read(&self, key: StorageKey) -> Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&self, key: StorageKey, contents: &str) -> Result<()> {
            self.check()?;
            self.inner.write(key, contents)
        }

        fn remove(&self, key: StorageKey) -> Result<()> {
            self.check()?;
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<()> {
            self.check()?;
            self.inner.clear()
        }
    }

    fn open<S: Storage>(storage: S) -> Storefront<S> {
        Storefront::builder()
            .storage(storage)
            .clock(fixed_now)
            .build()
            .unwrap()
    }

    /// Admin "boss" with a seeded catalog, then customer "jane" signed in.
    fn shop_with_customer() -> Storefront<InMemoryStorage> {
        let mut shop = open(InMemoryStorage::new());
        let _admin = shop.register("boss", "pw", None).unwrap();
        let _count = shop.seed_catalog().unwrap();
        let _jane = shop.register("jane", "pw", None).unwrap();
        shop
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

    #[test]
    fn build_requires_storage() {
        let result = Storefront::<InMemoryStorage>::builder().build();
        assert!(matches!(result, Err(StorefrontError::Storage(_))));
    }

    #[test]
    fn fresh_store_starts_on_login() {
        let shop = open(InMemoryStorage::new());
        assert_eq!(shop.screen(), Screen::Login);
        assert!(shop.current_user().is_none());
        assert!(shop.products().is_empty());
        assert!(shop.cart().is_empty());
    }

    #[test]
    fn first_registrant_is_admin() {
        let mut shop = open(InMemoryStorage::new());
        let first = shop.register("boss", "pw", None).unwrap();
        assert!(first.is_admin());
        assert_eq!(shop.screen(), Screen::Shop);
        let second = shop.register("jane", "pw", None).unwrap();
        assert!(!second.is_admin());
        assert_eq!(shop.current_user().unwrap().identifier, "jane");
    }

    #[test]
    fn cart_to_order_flow() {
        let mut shop = shop_with_customer();
        let bread = ProductId::new(2);
        let _line = shop.add_to_cart(bread).unwrap();
        let line = shop.add_to_cart(bread).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(shop.cart().lines().len(), 1);
        assert_eq!(shop.cart_subtotal(), 130);
        assert_eq!(shop.cart_total(), 230);

        let order = shop.checkout(&delivery()).unwrap();
        assert_eq!(order.total, 230);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.owner, "jane");
        assert!(shop.cart().is_empty());
        assert_eq!(shop.screen(), Screen::Orders);
        assert_eq!(shop.visible_orders().len(), 1);
        assert!(shop.notice().unwrap().message.contains("placed"));
    }

    #[test]
    fn checkout_empty_cart_fails_without_order() {
        let mut shop = shop_with_customer();
        let err = shop.checkout(&delivery()).unwrap_err();
        assert!(matches!(err, StorefrontError::EmptyCart));
        assert!(shop.visible_orders().is_empty());
    }

    #[test]
    fn checkout_blank_delivery_keeps_cart() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(1)).unwrap();
        let details = DeliveryDetails {
            phone: String::new(),
            ..delivery()
        };
        let err = shop.checkout(&details).unwrap_err();
        assert!(matches!(err, StorefrontError::Validation { field: "phone", .. }));
        assert_eq!(shop.cart().item_count(), 1);
    }

    #[test]
    fn cart_requires_session_and_known_product() {
        let mut shop = shop_with_customer();
        assert!(matches!(
            shop.add_to_cart(ProductId::new(999)),
            Err(StorefrontError::NotFound { .. })
        ));
        shop.logout().unwrap();
        assert!(matches!(
            shop.add_to_cart(ProductId::new(1)),
            Err(StorefrontError::Unauthorized { .. })
        ));
        assert!(matches!(
            shop.checkout(&delivery()),
            Err(StorefrontError::Unauthorized { .. })
        ));
    }

    #[test]
    fn logout_and_user_switch_clear_cart() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(3)).unwrap();
        let _boss = shop.login("boss", "pw").unwrap();
        assert!(shop.cart().is_empty());

        let _line = shop.add_to_cart(ProductId::new(3)).unwrap();
        shop.logout().unwrap();
        assert!(shop.cart().is_empty());
        assert_eq!(shop.screen(), Screen::Login);

        let _jane = shop.login("jane", "pw").unwrap();
        assert!(shop.cart().is_empty());
    }

    #[test]
    fn login_as_same_user_keeps_cart() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(3)).unwrap();
        let _jane = shop.login("jane", "pw").unwrap();
        assert_eq!(shop.cart().item_count(), 1);
    }

    #[test]
    fn customers_see_only_their_orders() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(6)).unwrap();
        let _order = shop.checkout(&delivery()).unwrap();

        let _tom = shop.register("tom", "pw", None).unwrap();
        assert!(shop.visible_orders().is_empty());

        let _boss = shop.login("boss", "pw").unwrap();
        assert_eq!(shop.visible_orders().len(), 1);
    }

    #[test]
    fn status_workflow_and_revenue() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(2)).unwrap();
        let _line = shop.add_to_cart(ProductId::new(2)).unwrap();
        let order = shop.checkout(&delivery()).unwrap();

        assert!(matches!(
            shop.set_order_status(order.id, OrderStatus::Delivered),
            Err(StorefrontError::Unauthorized { .. })
        ));
        assert!(matches!(
            shop.revenue(OrderStatus::Delivered),
            Err(StorefrontError::Unauthorized { .. })
        ));

        let _boss = shop.login("boss", "pw").unwrap();
        assert_eq!(shop.revenue(OrderStatus::Delivered).unwrap(), 0);
        let dispatched = shop
            .set_order_status(order.id, OrderStatus::Dispatched)
            .unwrap();
        assert_eq!(dispatched.status, OrderStatus::Dispatched);
        let delivered = shop
            .set_order_status(order.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(shop.revenue(OrderStatus::Delivered).unwrap(), 230);

        assert!(matches!(
            shop.set_order_status(order.id, OrderStatus::Pending),
            Err(StorefrontError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn catalog_admin_operations() {
        let mut shop = shop_with_customer();
        assert!(matches!(
            shop.add_product(ProductDraft::new("Sugar", "150", "Grains", "5")),
            Err(StorefrontError::Unauthorized { .. })
        ));

        let _boss = shop.login("boss", "pw").unwrap();
        let sugar = shop
            .add_product(ProductDraft::new("Sugar", "150", "Grains", "5"))
            .unwrap();
        assert_eq!(shop.product(sugar.id), Some(&sugar));

        let edited = shop
            .update_product(sugar.id, &ProductPatch::new().price("155"))
            .unwrap();
        assert_eq!(edited.price, 155);

        let removed = shop.remove_product(sugar.id).unwrap();
        assert_eq!(removed.id, sugar.id);
        assert!(shop.product(sugar.id).is_none());
        assert_eq!(shop.products().len(), 7);
    }

    #[test]
    fn removed_product_stays_in_cart_snapshot() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(5)).unwrap();
        let _boss = shop.login("boss", "pw").unwrap();
        let _line = shop.add_to_cart(ProductId::new(5)).unwrap();
        let _removed = shop.remove_product(ProductId::new(5)).unwrap();
        assert_eq!(shop.cart().lines()[0].product.name, "Sukuma Wiki (1kg)");
        assert_eq!(shop.cart_subtotal(), 70);
    }

    #[test]
    fn state_survives_reopen() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(4)).unwrap();
        let storage = shop.into_storage();

        let reopened = open(storage);
        assert_eq!(reopened.current_user().unwrap().identifier, "jane");
        assert_eq!(reopened.screen(), Screen::Shop);
        assert_eq!(reopened.products().len(), 7);
        assert_eq!(reopened.cart().item_count(), 1);
    }

    #[test]
    fn corrupt_entity_falls_back_to_default() {
        let shop = shop_with_customer();
        let storage = shop.into_storage();
        storage.write(StorageKey::Products, "{{{").unwrap();
        let reopened = open(storage);
        assert!(reopened.products().is_empty());
        assert_eq!(reopened.current_user().unwrap().identifier, "jane");
    }

    #[test]
    fn failed_save_leaves_memory_unchanged() {
        let mut shop = open(FlakyStorage::default());
        let _boss = shop.register("boss", "pw", None).unwrap();
        let _count = shop.seed_catalog().unwrap();
        shop.storage().break_writes();

        let err = shop
            .add_product(ProductDraft::new("Sugar", "150", "Grains", "5"))
            .unwrap_err();
        assert!(matches!(err, StorefrontError::Storage(_)));
        assert_eq!(shop.products().len(), 7);

        assert!(shop.add_to_cart(ProductId::new(1)).is_err());
        assert!(shop.cart().is_empty());

        assert!(shop.register("late", "pw", None).is_err());
        assert_eq!(shop.current_user().unwrap().identifier, "boss");
    }

    #[test]
    fn customer_cannot_reach_admin_screen() {
        let mut shop = shop_with_customer();
        assert_eq!(shop.navigate(Screen::Admin), Screen::Shop);
        let notice = shop.notice_at(fixed_now()).unwrap();
        assert_eq!(notice.message, "Access denied: Admins only.");
        assert!(shop.notice_at(at_offset(3_000)).is_none());
    }

    #[test]
    fn admin_screen_for_admin() {
        let mut shop = open(InMemoryStorage::new());
        let _boss = shop.register("boss", "pw", None).unwrap();
        assert_eq!(shop.navigate(Screen::Admin), Screen::Admin);
        shop.logout().unwrap();
        assert_eq!(shop.navigate(Screen::Cart), Screen::Login);
    }

    #[test]
    fn users_listing_is_admin_only() {
        let mut shop = shop_with_customer();
        assert!(shop.users().is_err());
        let _boss = shop.login("boss", "pw").unwrap();
        assert_eq!(shop.users().unwrap().len(), 2);
    }

    #[test]
    fn add_admin_keeps_session() {
        let mut shop = open(InMemoryStorage::new());
        let _boss = shop.register("boss", "pw", None).unwrap();
        let deputy = shop.add_admin("deputy", "pw").unwrap();
        assert!(deputy.is_admin());
        assert_eq!(shop.current_user().unwrap().identifier, "boss");
    }

    #[test]
    fn invite_policy_needs_existing_admin() {
        let mut shop = Storefront::builder()
            .storage(InMemoryStorage::new())
            .config(StorefrontConfig::new().role_policy(RolePolicy::AdminInvite))
            .clock(fixed_now)
            .build()
            .unwrap();
        let first = shop.register("first", "pw", None).unwrap();
        assert!(!first.is_admin());
        assert!(shop.add_admin("second", "pw").is_err());
    }

    #[test]
    fn export_then_import_round_trip() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(1)).unwrap();
        let _order = shop.checkout(&delivery()).unwrap();
        assert!(shop.export().is_err());

        let _boss = shop.login("boss", "pw").unwrap();
        let json = shop.export().unwrap();

        let mut other = open(InMemoryStorage::new());
        let _admin = other.register("admin", "pw", None).unwrap();
        let summary = other
            .import(r#"{"products": [], "orders": []}"#)
            .unwrap();
        assert_eq!(summary.products, Some(0));
        assert_eq!(summary.users, None);

        let summary = other.import(&json).unwrap();
        assert_eq!(summary.products, Some(7));
        assert_eq!(summary.orders, Some(1));
        assert_eq!(summary.users, Some(2));
        assert_eq!(other.products().len(), 7);
        // "admin" is not in the imported user list.
        assert!(other.current_user().is_none());
        assert_eq!(other.screen(), Screen::Login);
    }

    #[test]
    fn malformed_import_changes_nothing() {
        let mut shop = shop_with_customer();
        let _boss = shop.login("boss", "pw").unwrap();
        let products_before = shop.products().to_vec();
        let users_before = shop.users().unwrap().to_vec();

        for payload in [
            "not json",
            "[1, 2]",
            r#"{"products": [], "orders": "nope"}"#,
            r#"{"users": [{"id": 1}]}"#,
        ] {
            let err = shop.import(payload).unwrap_err();
            assert!(matches!(err, StorefrontError::MalformedImport(_)));
        }
        assert_eq!(shop.products(), products_before.as_slice());
        assert_eq!(shop.users().unwrap(), users_before.as_slice());
    }

    #[test]
    fn imported_identifiers_are_normalized_and_unique() {
        let mut shop = shop_with_customer();
        let _boss = shop.login("boss", "pw").unwrap();
        let users_before = shop.users().unwrap().to_vec();

        let duplicated = r#"{"products": [], "users": [
            {"id": 1, "username": "boss", "password": "pw", "role": "admin"},
            {"id": 2, "email": "Jane@Shop.com", "password": "pw", "role": "customer"},
            {"id": 3, "username": "dup", "password": "a", "role": "customer"},
            {"id": 4, "username": "dup", "password": "b", "role": "customer"}
        ]}"#;
        assert!(matches!(
            shop.import(duplicated),
            Err(StorefrontError::MalformedImport(_))
        ));
        assert_eq!(shop.users().unwrap(), users_before.as_slice());
        assert_eq!(shop.products().len(), 7);

        let summary = shop
            .import(
                r#"{"users": [
                    {"id": 1, "username": "boss", "password": "pw", "role": "admin"},
                    {"id": 2, "email": "Jane@Shop.com", "password": "pw", "role": "customer"}
                ]}"#,
            )
            .unwrap();
        assert_eq!(summary.users, Some(2));
        let identifiers: Vec<&str> = shop
            .users()
            .unwrap()
            .iter()
            .map(|user| user.identifier.as_str())
            .collect();
        assert_eq!(identifiers, ["boss", "jane@shop.com"]);

        shop.logout().unwrap();
        let jane = shop.login("Jane@Shop.com", "pw").unwrap();
        assert_eq!(jane.identifier, "jane@shop.com");
    }

    #[test]
    fn order_totals_survive_price_edit() {
        let mut shop = shop_with_customer();
        let bread = ProductId::new(2);
        let _line = shop.add_to_cart(bread).unwrap();
        let order = shop.checkout(&delivery()).unwrap();
        assert_eq!(order.total, 165);

        let _boss = shop.login("boss", "pw").unwrap();
        let _edited = shop
            .update_product(bread, &ProductPatch::new().price("90"))
            .unwrap();

        let stored = shop.order(order.id).unwrap();
        assert_eq!(stored.subtotal, 65);
        assert_eq!(stored.total, 165);
        assert_eq!(stored.total, stored.subtotal + stored.delivery_fee);
        assert_eq!(stored.items[0].product.price, 65);
    }

    #[test]
    fn order_lookup_follows_visibility() {
        let mut shop = shop_with_customer();
        let _line = shop.add_to_cart(ProductId::new(6)).unwrap();
        let order = shop.checkout(&delivery()).unwrap();
        assert_eq!(shop.order(order.id).map(|found| found.id), Some(order.id));

        let _sam = shop.register("sam", "pw", None).unwrap();
        assert!(shop.order(order.id).is_none());
        assert!(matches!(
            shop.delivered_revenue(),
            Err(StorefrontError::Unauthorized { .. })
        ));

        shop.logout().unwrap();
        assert!(shop.order(order.id).is_none());

        let _boss = shop.login("boss", "pw").unwrap();
        assert!(shop.order(order.id).is_some());
        assert_eq!(shop.delivered_revenue().unwrap(), 0);
        let _delivered = shop
            .set_order_status(order.id, OrderStatus::Delivered)
            .unwrap();
        assert_eq!(shop.delivered_revenue().unwrap(), 110);
    }

    #[test]
    fn stored_zero_quantity_lines_are_ignored() {
        let shop = shop_with_customer();
        shop.storage()
            .write(
                StorageKey::Cart,
                r#"[
                    {"product": {"id": 1, "name": "Milk", "price": 130, "category": "Dairy", "stock": 3}, "quantity": 0},
                    {"product": {"id": 2, "name": "Bread", "price": 65, "category": "Bakery", "stock": 3}, "quantity": 1}
                ]"#,
            )
            .unwrap();

        let reopened = open(shop.into_storage());
        assert_eq!(reopened.cart().lines().len(), 1);
        assert_eq!(reopened.cart_subtotal(), 65);
    }

    #[test]
    fn import_requires_admin() {
        let mut shop = shop_with_customer();
        assert!(matches!(
            shop.import(r#"{"products": []}"#),
            Err(StorefrontError::Unauthorized { .. })
        ));
        assert_eq!(shop.products().len(), 7);
    }

    #[test]
    fn flush_writes_every_entity() {
        let shop = shop_with_customer();
        shop.flush().unwrap();
        for key in StorageKey::ALL {
            assert!(shop.storage().read(key).unwrap().is_some(), "{key} missing");
        }
    }
}
