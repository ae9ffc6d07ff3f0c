//! Export/import envelope for moving store data between devices.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Order, Product, User, normalize_identifier};
use crate::error::{Result, StorefrontError};

/// Everything an admin export carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    /// Full catalog.
    pub products: Vec<Product>,
    /// Full order ledger, newest first.
    pub orders: Vec<Order>,
    /// Every registered user.
    pub users: Vec<User>,
}

/// Parsed import payload. Absent keys leave their collection alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportBundle {
    /// Replacement catalog.
    #[serde(default)]
    pub products: Option<Vec<Product>>,
    /// Replacement order ledger.
    #[serde(default)]
    pub orders: Option<Vec<Order>>,
    /// Replacement user registry.
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

impl ImportBundle {
    /// Parses a document and checks it before anything is replaced.
    ///
    /// User identifiers are normalized the way registration normalizes
    /// them. Blank or repeated identifiers, order lines with a zero
    /// quantity and orders whose money fields disagree are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError::MalformedImport`] describing the first
    /// problem found.
    #[inline]
    pub fn parse(json: &str) -> Result<Self> {
        let mut bundle: Self = serde_json::from_str(json)
            .map_err(|err| StorefrontError::MalformedImport(err.to_string()))?;
        if let Some(users) = bundle.users.as_mut() {
            normalize_users(users)?;
        }
        if let Some(orders) = bundle.orders.as_deref() {
            orders.iter().try_for_each(check_order)?;
        }
        Ok(bundle)
    }
}

/// Normalizes identifiers in place, rejecting blanks and duplicates.
fn normalize_users(users: &mut [User]) -> Result<()> {
    let mut seen = HashSet::with_capacity(users.len());
    for user in users {
        user.identifier = normalize_identifier(&user.identifier);
        if user.identifier.is_empty() {
            return Err(StorefrontError::MalformedImport(format!(
                "user {} has a blank identifier",
                user.id
            )));
        }
        if !seen.insert(user.identifier.clone()) {
            return Err(StorefrontError::MalformedImport(format!(
                "identifier `{}` appears more than once",
                user.identifier
            )));
        }
    }
    Ok(())
}

/// Checks quantities and totals of one order.
fn check_order(order: &Order) -> Result<()> {
    if order.items.iter().any(|line| line.quantity == 0) {
        return Err(StorefrontError::MalformedImport(format!(
            "order {} has a line with zero quantity",
            order.id
        )));
    }
    let subtotal = order
        .items
        .iter()
        .fold(0_u64, |acc, line| acc.saturating_add(line.line_total()));
    if order.subtotal != subtotal || order.total != subtotal.saturating_add(order.delivery_fee) {
        return Err(StorefrontError::MalformedImport(format!(
            "order {} totals do not add up",
            order.id
        )));
    }
    Ok(())
}

/// What an import replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of products imported, if the catalog was replaced.
    pub products: Option<usize>,
    /// Number of orders imported, if the ledger was replaced.
    pub orders: Option<usize>,
    /// Number of users imported, if the registry was replaced.
    pub users: Option<usize>,
}
