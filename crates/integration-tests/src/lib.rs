//! Integration tests for Verdant Commerce.
//!
//! These tests drive the commerce engine end to end over the in-memory
//! repositories from `verdant-test-support`. The engine only sees the
//! repository traits, so everything exercised here - cart semantics,
//! checkout atomicity, stock integrity under concurrency - holds
//! identically over the `PostgreSQL` backend.
//!
//! # Test Files
//!
//! - `cart_checkout_flow` - the guest-to-paid-order journey
//! - `stock_concurrency` - oversell races and competing checkouts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use verdant_commerce::models::product::NewProduct;
use verdant_commerce::repository::ProductRepository;
use verdant_commerce::{CartService, InventoryLedger, OrderService};
use verdant_core::{Price, ProductId};
use verdant_test_support::{
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryProductRepository,
};

/// A fully wired engine over in-memory storage.
pub struct TestBackend {
    /// The product store, kept accessible for direct stock assertions.
    pub products: Arc<InMemoryProductRepository>,
    /// Cart operations.
    pub carts: CartService,
    /// Order operations.
    pub orders: OrderService,
}

impl TestBackend {
    /// Wire up a fresh engine with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let products = Arc::new(InMemoryProductRepository::new());
        let carts = Arc::new(InMemoryCartRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let inventory = InventoryLedger::new(products.clone());
        Self {
            products: products.clone(),
            carts: CartService::new(carts, products.clone(), inventory.clone()),
            orders: OrderService::new(orders, products, inventory),
        }
    }

    /// Seed one product and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails (duplicate SKU).
    pub async fn seed_product(&self, sku: &str, price_cents: i64, stock: i32) -> ProductId {
        self.products
            .insert(NewProduct {
                name: format!("{sku} product"),
                description: String::new(),
                sku: sku.to_owned(),
                price: Price::from_cents(price_cents),
                stock,
            })
            .await
            .expect("seed product")
            .id
    }

    /// Current stock level of a product.
    ///
    /// # Panics
    ///
    /// Panics if the product does not exist.
    pub async fn stock_of(&self, id: ProductId) -> i32 {
        self.products
            .find(id)
            .await
            .expect("find product")
            .expect("product exists")
            .stock
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}
