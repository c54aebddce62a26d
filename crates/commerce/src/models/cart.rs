//! Cart entities and views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{CartId, CartItemId, OwnerKey, Price, ProductId};

use crate::models::product::ProductSummary;

/// A shopping cart. Owned by exactly one account or anonymous session for
/// its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// The identity this cart is keyed by.
    pub owner: OwnerKey,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart. Unique per product within its cart; quantity is always
/// positive - a line dropped to zero is deleted, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart item ID.
    pub id: CartItemId,
    /// Owning cart.
    pub cart_id: CartId,
    /// Referenced product. The product may change price or stock
    /// independently of this line.
    pub product_id: ProductId,
    /// Units of the product in the cart.
    pub quantity: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A cart line as returned to callers, priced at the product's live price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemView {
    /// Cart item ID.
    pub id: CartItemId,
    /// Referenced product ID.
    pub product_id: ProductId,
    /// Summary of the referenced product.
    pub product: ProductSummary,
    /// Units in the cart.
    pub quantity: i32,
    /// Current unit price.
    pub unit_price: Price,
    /// `unit_price` × `quantity`.
    pub line_subtotal: Price,
}

/// Cart state as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    /// Cart ID.
    pub id: CartId,
    /// Cart lines with live prices.
    pub items: Vec<CartItemView>,
    /// Total units across all lines.
    pub total_items: i32,
    /// Grand total at live prices.
    pub total_amount: Price,
}

/// Why a guest-cart line was skipped during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Combining the guest line with the account cart would exceed stock.
    InsufficientStock {
        /// Stock available at merge time.
        available: i32,
    },
    /// The product no longer exists in the catalog.
    ProductNotFound,
}

/// A guest-cart line that could not be merged into the account cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    /// The product whose line was skipped.
    pub product_id: ProductId,
    /// The quantity the guest cart held.
    pub requested: i32,
    /// Why the line was skipped.
    pub reason: SkipReason,
}

/// Result of merging a guest cart into an account cart.
///
/// The merge is best-effort per line, so partial success is the expected
/// common case rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// The account cart after the merge.
    pub cart: CartView,
    /// Guest lines that were skipped, in guest-cart order.
    pub skipped: Vec<SkippedItem>,
}
