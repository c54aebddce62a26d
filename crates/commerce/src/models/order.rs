//! Order entities and views.
//!
//! Orders are historical records: the total and each line's unit price are
//! computed once at creation and never re-derived from live catalog prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// An order. Always belongs to an authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Owning account.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Grand total frozen at creation.
    pub total_amount: Price,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A line in an order. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Order item ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Referenced product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: i32,
    /// Unit price frozen at order time. Does not track later catalog
    /// price changes.
    pub unit_price: Price,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequestItem {
    /// Product to order.
    pub product_id: ProductId,
    /// Units requested. Must be positive.
    pub quantity: i32,
}

/// An order line as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemView {
    /// Order item ID.
    pub id: OrderItemId,
    /// Referenced product ID.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: i32,
    /// Frozen unit price.
    pub unit_price: Price,
    /// `unit_price` × `quantity`.
    pub line_subtotal: Price,
}

/// Order state as returned to callers, with embedded lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    /// Order ID.
    pub id: OrderId,
    /// Owning account.
    pub user_id: UserId,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Grand total frozen at creation.
    pub total_amount: Price,
    /// Order lines with frozen prices.
    pub items: Vec<OrderItemView>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl OrderItemView {
    /// Build the view for a stored order line.
    #[must_use]
    pub fn from_item(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_subtotal: item.unit_price.times(item.quantity),
        }
    }
}

impl OrderView {
    /// Build the view for a stored order and its lines.
    #[must_use]
    pub fn from_parts(order: &Order, items: &[OrderItem]) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            items: items.iter().map(OrderItemView::from_item).collect(),
            created_at: order.created_at,
        }
    }
}
