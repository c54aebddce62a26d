//! Verdant Commerce - the commerce transaction engine.
//!
//! This crate keeps cart contents, product inventory, and order records
//! mutually consistent under concurrent access. It is a library-level
//! contract: the HTTP layer resolves an identity (account or anonymous
//! session), then calls into the services here. Persistence is abstracted
//! behind the [`repository`] traits, so the engine runs unchanged against
//! `PostgreSQL` in production and the in-memory backend in tests.
//!
//! # Components
//!
//! - [`inventory::InventoryLedger`] - per-product stock, with atomic
//!   check-and-reserve and release
//! - [`cart::CartService`] - cart state keyed by an [`OwnerKey`], including
//!   guest-to-account merge
//! - [`order::OrderService`] - two-pass checkout that validates, prices,
//!   and decrements inventory as one unit
//! - [`pricing`] - pure line/grand total arithmetic shared by carts and
//!   orders
//!
//! [`OwnerKey`]: verdant_core::OwnerKey

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod inventory;
pub mod models;
pub mod order;
pub mod pricing;
pub mod repository;

pub use cart::{CartError, CartService};
pub use inventory::{InventoryError, InventoryLedger};
pub use order::{OrderError, OrderService};
pub use repository::{
    CartRepository, OrderRepository, ProductRepository, RepositoryError, StockDecrement,
};
