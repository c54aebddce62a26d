//! Domain entities and the view shapes the engine returns to callers.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartItem, CartItemView, CartView, MergeOutcome, SkipReason, SkippedItem};
pub use order::{Order, OrderItem, OrderItemView, OrderRequestItem, OrderView};
pub use product::{NewProduct, Product, ProductSummary};
