//! Persistence abstractions for the commerce engine.
//!
//! One repository trait per entity family. Implementations live outside
//! this crate (`verdant-postgres` in production, `verdant-test-support` in
//! tests) and are handed to each service's constructor as `Arc<dyn …>` -
//! explicit dependency injection, no global state.
//!
//! The one non-CRUD primitive is [`ProductRepository::try_decrement_stock`]:
//! a single conditional update that only applies when enough stock remains.
//! Every stock-integrity guarantee in the engine rests on that primitive
//! being atomic per product.

use async_trait::async_trait;
use thiserror::Error;

use verdant_core::{
    CartId, CartItemId, OrderId, OrderStatus, OwnerKey, Price, ProductId, UserId,
};

use crate::models::cart::{Cart, CartItem};
use crate::models::order::{Order, OrderItem};
use crate::models::product::{NewProduct, Product};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store failed (connection loss, query failure, …).
    #[error("storage error: {0}")]
    Storage(String),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The row targeted by an update or delete does not exist.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// The decrement was applied; `remaining` is the stock level afterwards.
    Applied {
        /// Stock remaining after the decrement.
        remaining: i32,
    },
    /// Not enough stock; nothing was changed.
    Insufficient {
        /// Stock available at the time of the attempt.
        available: i32,
    },
    /// The product does not exist.
    NotFound,
}

/// Read access to the product catalog plus the atomic stock primitives.
///
/// The engine never creates or deletes products; `insert` and `list` exist
/// for seeding and tests.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Look up a product by ID.
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// List the whole catalog.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a new product.
    ///
    /// Fails with [`RepositoryError::Conflict`] on a duplicate SKU.
    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Atomically decrement stock by `quantity` if at least `quantity`
    /// remains.
    ///
    /// Must be a single conditional update, linearizable with respect to
    /// other stock operations on the same product - never a read followed
    /// by an unconditional write.
    async fn try_decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError>;

    /// Atomically increment stock by `quantity`, returning the new level.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the product is missing.
    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError>;
}

/// Cart and cart-item storage, keyed by owner.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find the cart for an owner key, if one exists.
    async fn find_by_owner(&self, owner: &OwnerKey) -> Result<Option<Cart>, RepositoryError>;

    /// Create an empty cart for an owner key.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the owner already has a
    /// cart.
    async fn create(&self, owner: &OwnerKey) -> Result<Cart, RepositoryError>;

    /// Delete a cart and all of its items.
    async fn delete(&self, id: CartId) -> Result<(), RepositoryError>;

    /// All items in a cart.
    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>;

    /// Look up a single cart item.
    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError>;

    /// Insert a new line into a cart.
    async fn insert_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError>;

    /// Replace a line's quantity.
    async fn set_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    /// Delete a single line.
    async fn delete_item(&self, id: CartItemId) -> Result<(), RepositoryError>;

    /// Delete every line in a cart. Succeeds on an already-empty cart.
    async fn clear_items(&self, cart_id: CartId) -> Result<(), RepositoryError>;
}

/// Order and order-item storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create a new order in [`OrderStatus::Pending`] with the given total.
    async fn create(&self, user_id: UserId, total: Price) -> Result<Order, RepositoryError>;

    /// Delete an order and its items.
    ///
    /// Only used to compensate a half-created order whose reservations
    /// failed; committed orders are immutable history.
    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError>;

    /// Look up an order by ID.
    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// All orders belonging to an account, newest first.
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// Append a line to an order, freezing the unit price.
    async fn insert_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) -> Result<OrderItem, RepositoryError>;

    /// All items in an order.
    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Overwrite an order's status.
    ///
    /// Transition legality is the service's responsibility; the repository
    /// stores whatever it is told.
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError>;
}
