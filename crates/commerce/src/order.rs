//! Order assembler: two-pass checkout and the order status lifecycle.
//!
//! Order creation validates every requested line against the catalog and
//! current stock (check pass) before touching any state, then reserves
//! stock line by line (commit pass). A reservation that loses a race after
//! the check pass aborts the order: every reservation already made in the
//! pass is released and the just-created order row is deleted, so no
//! half-materialized order ever survives.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument, warn};

use verdant_core::{OrderId, OrderStatus, Price, ProductId, UserId};

use crate::inventory::{InventoryError, InventoryLedger};
use crate::models::order::{OrderRequestItem, OrderView};
use crate::models::product::Product;
use crate::pricing;
use crate::repository::{OrderRepository, ProductRepository, RepositoryError};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order request contained no items.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// A requested quantity was zero or negative.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    /// A requested product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// A line failed the availability check. The client should shrink the
    /// order.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// The product that was short.
        product_id: ProductId,
        /// Units requested.
        requested: i32,
        /// Units actually available.
        available: i32,
    },

    /// A reservation raced a concurrent order and lost after the check
    /// pass had succeeded. The whole checkout was rolled back; the client
    /// should retry it.
    #[error("stock for product {0} was claimed by a concurrent order")]
    StockConflict(ProductId),

    /// The requested status change is not allowed by the lifecycle.
    #[error("invalid status transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Status the order is currently in.
        from: OrderStatus,
        /// Status that was requested.
        to: OrderStatus,
    },

    /// The backing store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<InventoryError> for OrderError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ProductNotFound(id) => Self::ProductNotFound(id),
            InventoryError::InsufficientStock {
                product_id,
                requested,
                available,
            } => Self::InsufficientStock {
                product_id,
                requested,
                available,
            },
            InventoryError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Order creation, queries, and status transitions.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    inventory: InventoryLedger,
}

impl OrderService {
    /// Create an order service over the given repositories.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        inventory: InventoryLedger,
    ) -> Self {
        Self {
            orders,
            products,
            inventory,
        }
    }

    /// Create an order for an account from a list of requested lines.
    ///
    /// Two passes:
    ///
    /// 1. **Check** - every line is validated against the catalog and
    ///    current stock. Any failure aborts with nothing mutated.
    /// 2. **Commit** - the order row is created with the grand total at
    ///    current prices, then stock is reserved line by line. A
    ///    reservation that fails here (a race since the check pass) rolls
    ///    back every reservation already made, deletes the order row, and
    ///    surfaces [`OrderError::StockConflict`].
    ///
    /// On success each order line carries the unit price read during the
    /// check pass, frozen for the life of the order.
    ///
    /// # Errors
    ///
    /// `EmptyOrder` / `InvalidQuantity` for malformed requests,
    /// `ProductNotFound` / `InsufficientStock` from the check pass,
    /// `StockConflict` from a lost commit-pass race.
    #[instrument(skip(self, items), fields(user_id = %user_id, lines = items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        items: &[OrderRequestItem],
    ) -> Result<OrderView, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for item in items {
            if item.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(item.quantity));
            }
        }

        // Check pass: validate everything before mutating anything. Unit
        // prices read here are the ones frozen into the order.
        let mut checked: Vec<(Product, i32)> = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .products
                .find(item.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            self.inventory
                .check_availability(item.product_id, item.quantity)
                .await?;
            checked.push((product, item.quantity));
        }

        let lines: Vec<_> = checked
            .iter()
            .map(|(product, quantity)| (product.price, *quantity))
            .collect();
        let totals = pricing::compute_totals(&lines);

        // The order row exists before any stock moves, so compensation has
        // an identifier to clean up against.
        let order = self.orders.create(user_id, totals.grand_total).await?;

        // Commit pass: conditional decrements, newest state wins.
        let mut reserved: Vec<(ProductId, i32)> = Vec::with_capacity(checked.len());
        for (product, quantity) in &checked {
            match self.inventory.reserve(product.id, *quantity).await {
                Ok(()) => reserved.push((product.id, *quantity)),
                Err(err) => {
                    warn!(
                        order_id = %order.id,
                        product_id = %product.id,
                        "reservation failed after check pass; rolling back order"
                    );
                    self.compensate(order.id, &reserved).await;
                    return Err(match err {
                        InventoryError::InsufficientStock { product_id, .. } => {
                            OrderError::StockConflict(product_id)
                        }
                        InventoryError::ProductNotFound(id) => OrderError::ProductNotFound(id),
                        InventoryError::Repository(e) => OrderError::Repository(e),
                    });
                }
            }
        }

        for (product, quantity) in &checked {
            self.orders
                .insert_item(order.id, product.id, *quantity, product.price)
                .await?;
        }

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total_amount,
            "created order"
        );
        self.view(order.id).await
    }

    /// All orders belonging to an account, with embedded lines.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the backing store fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OrderView>, OrderError> {
        let orders = self.orders.find_by_user(user_id).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in &orders {
            let items = self.orders.items(order.id).await?;
            views.push(OrderView::from_parts(order, &items));
        }
        Ok(views)
    }

    /// A single order with embedded lines and frozen prices.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if the order does not exist.
    pub async fn find_order(&self, id: OrderId) -> Result<OrderView, OrderError> {
        self.view(id).await
    }

    /// Move an order to a new status, enforcing the lifecycle.
    ///
    /// Transitioning to [`OrderStatus::Cancelled`] releases each line's
    /// quantity back to inventory. The status write happens first, so a
    /// retried cancellation is rejected as an invalid transition instead of
    /// double-releasing stock.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if the order does not exist, `InvalidTransition` if
    /// the lifecycle forbids the change.
    #[instrument(skip(self), fields(order_id = %id, status = ?status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderView, OrderError> {
        let order = self
            .orders
            .find(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;

        if !order.status.can_transition_to(status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: status,
            });
        }

        self.orders.set_status(id, status).await?;

        if status == OrderStatus::Cancelled {
            for item in self.orders.items(id).await? {
                match self.inventory.release(item.product_id, item.quantity).await {
                    Ok(()) => {}
                    Err(InventoryError::ProductNotFound(product_id)) => {
                        // The product left the catalog; there is no stock
                        // row to restore.
                        warn!(order_id = %id, product_id = %product_id, "release on cancel: product gone");
                    }
                    Err(other) => return Err(other.into()),
                }
            }
            info!(order_id = %id, "cancelled order and released stock");
        }

        self.view(id).await
    }

    /// Best-effort rollback of a failed commit pass: release what was
    /// reserved, then delete the order row. Failures here are logged and
    /// swallowed - the original reservation error is what the caller needs
    /// to see.
    async fn compensate(&self, order_id: OrderId, reserved: &[(ProductId, i32)]) {
        for &(product_id, quantity) in reserved {
            if let Err(err) = self.inventory.release(product_id, quantity).await {
                error!(
                    order_id = %order_id,
                    product_id = %product_id,
                    quantity,
                    error = %err,
                    "failed to release reservation during rollback"
                );
            }
        }
        if let Err(err) = self.orders.delete(order_id).await {
            error!(order_id = %order_id, error = %err, "failed to delete rolled-back order");
        }
    }

    async fn view(&self, id: OrderId) -> Result<OrderView, OrderError> {
        let order = self
            .orders
            .find(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))?;
        let items = self.orders.items(id).await?;
        Ok(OrderView::from_parts(&order, &items))
    }
}
