//! In-memory order repository.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use verdant_commerce::models::order::{Order, OrderItem};
use verdant_commerce::repository::{OrderRepository, RepositoryError};
use verdant_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// An in-memory order store.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
    items: Mutex<Vec<OrderItem>>,
    next_order_id: AtomicI32,
    next_item_id: AtomicI32,
}

impl InMemoryOrderRepository {
    /// Create an empty order store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_orders(&self) -> std::sync::MutexGuard<'_, Vec<Order>> {
        self.orders.lock().expect("order list lock poisoned")
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<OrderItem>> {
        self.items.lock().expect("order item list lock poisoned")
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, user_id: UserId, total: Price) -> Result<Order, RepositoryError> {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.next_order_id.fetch_add(1, Ordering::Relaxed) + 1),
            user_id,
            status: OrderStatus::Pending,
            total_amount: total,
            created_at: now,
            updated_at: now,
        };
        self.lock_orders().push(order.clone());
        Ok(order)
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut orders = self.lock_orders();
        let before = orders.len();
        orders.retain(|order| order.id != id);
        if orders.len() == before {
            return Err(RepositoryError::NotFound);
        }
        self.lock_items().retain(|item| item.order_id != id);
        Ok(())
    }

    async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .lock_orders()
            .iter()
            .find(|order| order.id == id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .lock_orders()
            .iter()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.id));
        Ok(orders)
    }

    async fn insert_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price: Price,
    ) -> Result<OrderItem, RepositoryError> {
        let item = OrderItem {
            id: OrderItemId::new(self.next_item_id.fetch_add(1, Ordering::Relaxed) + 1),
            order_id,
            product_id,
            quantity,
            unit_price,
        };
        self.lock_items().push(item.clone());
        Ok(item)
    }

    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self
            .lock_items()
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let mut orders = self.lock_orders();
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}
