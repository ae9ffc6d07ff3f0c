//! Storefront core for the FreshMart grocery shop.
//!
//! This crate holds the order and store logic behind a small online
//! grocery: accounts with admin and customer roles, a product catalog, a
//! quantity-aggregated cart, checkout into an order ledger with a
//! `Pending -> Dispatched -> Delivered` workflow, screen routing with
//! transient notices, and admin export/import. State persists through a
//! pluggable [`storage::Storage`] backend, one JSON document per entity.
//!
//! Start with [`storefront::Storefront::builder()`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod models;
pub mod storage;
pub mod store;
pub mod storefront;
pub mod view;
