//! Cart store: cart state keyed by account or anonymous-session identity.
//!
//! Carts are created lazily on first access for an owner key. Additions and
//! quantity updates are validated against current stock, but carts never
//! consume stock - reservation happens only at checkout. The guest-to-
//! account merge is best-effort per line and reports skipped lines back to
//! the caller instead of failing the whole merge.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use verdant_core::{CartItemId, OwnerKey, ProductId, SessionId, UserId};

use crate::inventory::{InventoryError, InventoryLedger};
use crate::models::cart::{
    Cart, CartItemView, CartView, MergeOutcome, SkipReason, SkippedItem,
};
use crate::models::product::ProductSummary;
use crate::pricing;
use crate::repository::{CartRepository, ProductRepository, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity was zero or negative.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    /// The product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart item does not exist or belongs to a different cart.
    #[error("cart item {0} not found")]
    ItemNotFound(CartItemId),

    /// Not enough stock for the cumulative requested quantity.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// The product that was short.
        product_id: ProductId,
        /// Cumulative units requested (existing line + addition).
        requested: i32,
        /// Units actually available.
        available: i32,
    },

    /// The backing store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<InventoryError> for CartError {
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

/// Cart operations keyed by an [`OwnerKey`].
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartRepository>,
    products: Arc<dyn ProductRepository>,
    inventory: InventoryLedger,
}

impl CartService {
    /// Create a cart service over the given repositories.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        products: Arc<dyn ProductRepository>,
        inventory: InventoryLedger,
    ) -> Self {
        Self {
            carts,
            products,
            inventory,
        }
    }

    /// Find the cart for an owner key, creating an empty one if none
    /// exists. Repeated calls with the same key return the same cart.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the backing store fails.
    pub async fn resolve_cart(&self, owner: &OwnerKey) -> Result<Cart, CartError> {
        if let Some(cart) = self.carts.find_by_owner(owner).await? {
            return Ok(cart);
        }
        let cart = self.carts.create(owner).await?;
        info!(owner = %owner, cart_id = %cart.id, "created cart");
        Ok(cart)
    }

    /// Current cart state for an owner, priced at live product prices.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the backing store fails.
    pub async fn get_cart(&self, owner: &OwnerKey) -> Result<CartView, CartError> {
        let cart = self.resolve_cart(owner).await?;
        self.build_view(&cart).await
    }

    /// Add `quantity` units of a product to the owner's cart.
    ///
    /// Availability is checked against the *cumulative* quantity (existing
    /// line plus the addition); on failure the cart is unchanged. Stock is
    /// not consumed - the check is advisory until checkout.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a non-positive quantity, `ProductNotFound` for
    /// an unknown product, `InsufficientStock` when the cumulative quantity
    /// exceeds current stock.
    #[instrument(skip(self), fields(owner = %owner, product_id = %product_id, quantity))]
    pub async fn add_item(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let cart = self.resolve_cart(owner).await?;
        self.add_to_cart(&cart, product_id, quantity).await?;
        self.build_view(&cart).await
    }

    /// Replace a cart line's quantity with a new absolute value.
    ///
    /// Re-validates against current stock for the new quantity. The item
    /// must belong to the owner's cart.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a non-positive quantity, `ItemNotFound` if the
    /// line is missing or owned by another cart, `InsufficientStock` when
    /// the new quantity exceeds current stock.
    #[instrument(skip(self), fields(owner = %owner, item_id = %item_id, quantity))]
    pub async fn update_item(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let cart = self.resolve_cart(owner).await?;
        let item = self
            .carts
            .find_item(item_id)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or(CartError::ItemNotFound(item_id))?;

        self.inventory
            .check_availability(item.product_id, quantity)
            .await?;
        self.carts.set_item_quantity(item.id, quantity).await?;
        self.build_view(&cart).await
    }

    /// Remove a line from the owner's cart.
    ///
    /// Not idempotent by design: removing an absent line is `ItemNotFound`,
    /// so callers can distinguish "removed" from "nothing to remove".
    ///
    /// # Errors
    ///
    /// `ItemNotFound` if the line is missing or owned by another cart.
    #[instrument(skip(self), fields(owner = %owner, item_id = %item_id))]
    pub async fn remove_item(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
    ) -> Result<CartView, CartError> {
        let cart = self.resolve_cart(owner).await?;
        let item = self
            .carts
            .find_item(item_id)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or(CartError::ItemNotFound(item_id))?;

        self.carts.delete_item(item.id).await?;
        self.build_view(&cart).await
    }

    /// Delete every line in the owner's cart. Succeeds on an already-empty
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the backing store fails.
    pub async fn clear(&self, owner: &OwnerKey) -> Result<CartView, CartError> {
        let cart = self.resolve_cart(owner).await?;
        self.carts.clear_items(cart.id).await?;
        self.build_view(&cart).await
    }

    /// Merge a guest session's cart into an account's cart.
    ///
    /// Each guest line is attempted independently with the same cumulative
    /// stock validation as [`add_item`]; lines that fail stock or whose
    /// product has vanished are skipped and reported in the outcome rather
    /// than aborting the merge. A guest cart that had lines is deleted
    /// afterwards; a missing or empty guest cart leaves everything
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the backing store fails; per-line stock
    /// failures are never surfaced as errors.
    ///
    /// [`add_item`]: Self::add_item
    #[instrument(skip(self), fields(session_id = %session_id, user_id = %user_id))]
    pub async fn merge_guest_into_account(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> Result<MergeOutcome, CartError> {
        let account_owner = OwnerKey::Account(user_id);
        let account_cart = self.resolve_cart(&account_owner).await?;

        let Some(guest_cart) = self
            .carts
            .find_by_owner(&OwnerKey::Session(session_id))
            .await?
        else {
            return Ok(MergeOutcome {
                cart: self.build_view(&account_cart).await?,
                skipped: Vec::new(),
            });
        };

        let guest_items = self.carts.items(guest_cart.id).await?;
        if guest_items.is_empty() {
            return Ok(MergeOutcome {
                cart: self.build_view(&account_cart).await?,
                skipped: Vec::new(),
            });
        }

        let mut skipped = Vec::new();
        for item in &guest_items {
            match self
                .add_to_cart(&account_cart, item.product_id, item.quantity)
                .await
            {
                Ok(()) => {}
                Err(CartError::InsufficientStock { available, .. }) => {
                    info!(
                        product_id = %item.product_id,
                        requested = item.quantity,
                        available,
                        "skipping guest line: insufficient stock"
                    );
                    skipped.push(SkippedItem {
                        product_id: item.product_id,
                        requested: item.quantity,
                        reason: SkipReason::InsufficientStock { available },
                    });
                }
                Err(CartError::ProductNotFound(product_id)) => {
                    info!(product_id = %product_id, "skipping guest line: product gone");
                    skipped.push(SkippedItem {
                        product_id,
                        requested: item.quantity,
                        reason: SkipReason::ProductNotFound,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.carts.delete(guest_cart.id).await?;
        info!(
            merged = guest_items.len() - skipped.len(),
            skipped = skipped.len(),
            "merged guest cart into account cart"
        );

        Ok(MergeOutcome {
            cart: self.build_view(&account_cart).await?,
            skipped,
        })
    }

    /// Shared add semantics: cumulative stock check, then upsert the line.
    async fn add_to_cart(
        &self,
        cart: &Cart,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), CartError> {
        // Existence check up front so "no such product" wins over "no stock".
        if self.products.find(product_id).await?.is_none() {
            return Err(CartError::ProductNotFound(product_id));
        }

        let items = self.carts.items(cart.id).await?;
        let existing = items.iter().find(|item| item.product_id == product_id);

        let cumulative = existing.map_or(quantity, |item| item.quantity + quantity);
        self.inventory
            .check_availability(product_id, cumulative)
            .await?;

        match existing {
            Some(item) => self.carts.set_item_quantity(item.id, cumulative).await?,
            None => {
                self.carts.insert_item(cart.id, product_id, quantity).await?;
            }
        }
        Ok(())
    }

    /// Shape a cart for the caller: live prices, per-line subtotals,
    /// quantity and amount totals.
    async fn build_view(&self, cart: &Cart) -> Result<CartView, CartError> {
        let items = self.carts.items(cart.id).await?;
        let mut views = Vec::with_capacity(items.len());

        for item in &items {
            let Some(product) = self.products.find(item.product_id).await? else {
                // The product reference is weak; a line whose product was
                // removed from the catalog is dropped from the view.
                warn!(
                    cart_id = %cart.id,
                    product_id = %item.product_id,
                    "cart line references missing product; omitting from view"
                );
                continue;
            };
            views.push(CartItemView {
                id: item.id,
                product_id: item.product_id,
                product: ProductSummary::from(&product),
                quantity: item.quantity,
                unit_price: product.price,
                line_subtotal: pricing::line_subtotal(product.price, item.quantity),
            });
        }

        let lines: Vec<_> = views
            .iter()
            .map(|view| (view.unit_price, view.quantity))
            .collect();
        let totals = pricing::compute_totals(&lines);

        Ok(CartView {
            id: cart.id,
            items: views,
            total_items: lines.iter().map(|&(_, quantity)| quantity).sum(),
            total_amount: totals.grand_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use verdant_core::Price;
    use verdant_test_support::{InMemoryCartRepository, InMemoryProductRepository};

    use super::*;
    use crate::models::product::NewProduct;

    struct Fixture {
        service: CartService,
        products: Arc<InMemoryProductRepository>,
    }

    /// Build a cart service over in-memory stores, seeding one product per
    /// `(sku, price_cents, stock)` tuple. Product IDs come back in input
    /// order.
    async fn fixture(seed: &[(&str, i64, i32)]) -> (Fixture, Vec<ProductId>) {
        let products = Arc::new(InMemoryProductRepository::new());
        let mut ids = Vec::new();
        for &(sku, cents, stock) in seed {
            let product = products
                .insert(NewProduct {
                    name: format!("{sku} product"),
                    description: String::new(),
                    sku: sku.to_owned(),
                    price: Price::from_cents(cents),
                    stock,
                })
                .await
                .expect("seed product");
            ids.push(product.id);
        }
        let carts = Arc::new(InMemoryCartRepository::new());
        let inventory = InventoryLedger::new(products.clone());
        let service = CartService::new(carts, products.clone(), inventory);
        (Fixture { service, products }, ids)
    }

    fn account(id: i32) -> OwnerKey {
        OwnerKey::Account(UserId::new(id))
    }

    #[tokio::test]
    async fn test_resolve_cart_is_deterministic() {
        let (fx, _) = fixture(&[]).await;
        let owner = account(1);
        let first = fx.service.resolve_cart(&owner).await.expect("resolve");
        let second = fx.service.resolve_cart(&owner).await.expect("resolve again");
        assert_eq!(first.id, second.id);

        let other = fx
            .service
            .resolve_cart(&OwnerKey::Session(SessionId::generate()))
            .await
            .expect("resolve other owner");
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn test_add_item_prices_the_view() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let view = fx
            .service
            .add_item(&account(1), ids[0], 3)
            .await
            .expect("add");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 3);
        assert_eq!(view.items[0].unit_price, Price::from_cents(1000));
        assert_eq!(view.items[0].line_subtotal, Price::from_cents(3000));
        assert_eq!(view.items[0].product.sku, "WID-1");
        assert_eq!(view.total_items, 3);
        assert_eq!(view.total_amount, Price::from_cents(3000));
    }

    #[tokio::test]
    async fn test_add_item_rejects_cumulative_overrun() {
        // Stock 5: a second add of 3 would make the line 6.
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let owner = account(1);
        fx.service
            .add_item(&owner, ids[0], 3)
            .await
            .expect("first add");
        let err = fx.service.add_item(&owner, ids[0], 3).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
        // Cart unchanged by the failed add.
        let view = fx.service.get_cart(&owner).await.expect("get cart");
        assert_eq!(view.items[0].quantity, 3);
        assert_eq!(view.total_amount, Price::from_cents(3000));
    }

    #[tokio::test]
    async fn test_add_item_merges_into_existing_line() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 10)]).await;
        let owner = account(1);
        fx.service.add_item(&owner, ids[0], 2).await.expect("add");
        let view = fx
            .service
            .add_item(&owner, ids[0], 3)
            .await
            .expect("add more");
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_add_item_validates_quantity() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        for quantity in [0, -1] {
            let err = fx
                .service
                .add_item(&account(1), ids[0], quantity)
                .await
                .unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity(q) if q == quantity));
        }
    }

    #[tokio::test]
    async fn test_add_item_unknown_product() {
        let (fx, _) = fixture(&[]).await;
        let err = fx
            .service
            .add_item(&account(1), ProductId::new(404), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_item_revalidates_absolute_quantity() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let owner = account(1);
        let view = fx.service.add_item(&owner, ids[0], 2).await.expect("add");
        let item_id = view.items[0].id;

        let view = fx
            .service
            .update_item(&owner, item_id, 5)
            .await
            .expect("update to stock limit");
        assert_eq!(view.items[0].quantity, 5);

        let err = fx.service.update_item(&owner, item_id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_item_of_other_cart_is_not_found() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let view = fx
            .service
            .add_item(&account(1), ids[0], 1)
            .await
            .expect("add");
        let foreign_item = view.items[0].id;

        let err = fx
            .service
            .update_item(&account(2), foreign_item, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_prior_item_set() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let owner = account(1);
        let view = fx.service.add_item(&owner, ids[0], 2).await.expect("add");
        let item_id = view.items[0].id;

        let view = fx
            .service
            .remove_item(&owner, item_id)
            .await
            .expect("remove");
        assert!(view.items.is_empty());
        assert_eq!(view.total_items, 0);
        assert_eq!(view.total_amount, Price::ZERO);

        // Removal is not idempotent: a second remove is an error the caller
        // can distinguish from success.
        let err = fx.service.remove_item(&owner, item_id).await.unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_clear_succeeds_on_empty_and_full_carts() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5), ("WID-2", 500, 5)]).await;
        let owner = account(1);

        let view = fx.service.clear(&owner).await.expect("clear empty cart");
        assert!(view.items.is_empty());

        fx.service.add_item(&owner, ids[0], 1).await.expect("add");
        fx.service.add_item(&owner, ids[1], 2).await.expect("add");
        let view = fx.service.clear(&owner).await.expect("clear full cart");
        assert!(view.items.is_empty());
        assert_eq!(view.total_amount, Price::ZERO);
    }

    #[tokio::test]
    async fn test_merge_with_empty_guest_cart_changes_nothing() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        let session = SessionId::generate();
        let user = UserId::new(1);

        fx.service
            .add_item(&OwnerKey::Account(user), ids[0], 2)
            .await
            .expect("account add");
        // Guest cart exists but holds no lines.
        fx.service
            .resolve_cart(&OwnerKey::Session(session))
            .await
            .expect("guest cart");

        let outcome = fx
            .service
            .merge_guest_into_account(session, user)
            .await
            .expect("merge");
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.cart.total_items, 2);
        assert_eq!(outcome.cart.total_amount, Price::from_cents(2000));
    }

    #[tokio::test]
    async fn test_merge_combines_quantities_and_deletes_guest_cart() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5), ("WID-2", 500, 5)]).await;
        let session = SessionId::generate();
        let user = UserId::new(1);
        let guest = OwnerKey::Session(session);
        let owner = OwnerKey::Account(user);

        fx.service.add_item(&owner, ids[0], 1).await.expect("account add");
        fx.service.add_item(&guest, ids[0], 2).await.expect("guest add");
        fx.service.add_item(&guest, ids[1], 1).await.expect("guest add");

        let outcome = fx
            .service
            .merge_guest_into_account(session, user)
            .await
            .expect("merge");
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.cart.total_items, 4);

        let merged_line = outcome
            .cart
            .items
            .iter()
            .find(|item| item.product_id == ids[0])
            .expect("merged line");
        assert_eq!(merged_line.quantity, 3);

        // The guest cart is gone; resolving the session key starts fresh.
        let fresh = fx.service.get_cart(&guest).await.expect("fresh guest cart");
        assert!(fresh.items.is_empty());
    }

    #[tokio::test]
    async fn test_merge_skips_short_lines_but_merges_the_rest() {
        // Account holds WID-1 x1; guest holds WID-1 x2 and WID-2 x1.
        // WID-1 stock of 2 cannot cover the combined 3, so that line is
        // skipped while WID-2 still merges.
        let (fx, ids) = fixture(&[("WID-1", 1000, 2), ("WID-2", 500, 5)]).await;
        let session = SessionId::generate();
        let user = UserId::new(1);
        let guest = OwnerKey::Session(session);
        let owner = OwnerKey::Account(user);

        fx.service.add_item(&owner, ids[0], 1).await.expect("account add");
        fx.service.add_item(&guest, ids[0], 2).await.expect("guest add");
        fx.service.add_item(&guest, ids[1], 1).await.expect("guest add");

        let outcome = fx
            .service
            .merge_guest_into_account(session, user)
            .await
            .expect("merge");

        assert_eq!(
            outcome.skipped,
            vec![SkippedItem {
                product_id: ids[0],
                requested: 2,
                reason: SkipReason::InsufficientStock { available: 2 },
            }]
        );

        let kept_line = outcome
            .cart
            .items
            .iter()
            .find(|item| item.product_id == ids[0])
            .expect("account line survives");
        assert_eq!(kept_line.quantity, 1);
        assert!(outcome.cart.items.iter().any(|item| item.product_id == ids[1]));

        // Guest cart is deleted even after a partial merge.
        let fresh = fx.service.get_cart(&guest).await.expect("fresh guest cart");
        assert!(fresh.items.is_empty());
    }

    #[tokio::test]
    async fn test_add_item_does_not_consume_stock() {
        let (fx, ids) = fixture(&[("WID-1", 1000, 5)]).await;
        fx.service
            .add_item(&account(1), ids[0], 5)
            .await
            .expect("add");
        let product = fx
            .products
            .find(ids[0])
            .await
            .expect("find")
            .expect("product");
        assert_eq!(product.stock, 5);
    }
}
