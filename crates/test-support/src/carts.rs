//! In-memory cart repository.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use verdant_commerce::models::cart::{Cart, CartItem};
use verdant_commerce::repository::{CartRepository, RepositoryError};
use verdant_core::{CartId, CartItemId, OwnerKey, ProductId};

/// An in-memory cart store. Items keep insertion order, matching the
/// row-ordering the SQL backend produces.
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<Vec<Cart>>,
    items: Mutex<Vec<CartItem>>,
    next_cart_id: AtomicI32,
    next_item_id: AtomicI32,
}

impl InMemoryCartRepository {
    /// Create an empty cart store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_carts(&self) -> std::sync::MutexGuard<'_, Vec<Cart>> {
        self.carts.lock().expect("cart list lock poisoned")
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Vec<CartItem>> {
        self.items.lock().expect("cart item list lock poisoned")
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find_by_owner(&self, owner: &OwnerKey) -> Result<Option<Cart>, RepositoryError> {
        Ok(self
            .lock_carts()
            .iter()
            .find(|cart| cart.owner == *owner)
            .cloned())
    }

    async fn create(&self, owner: &OwnerKey) -> Result<Cart, RepositoryError> {
        let mut carts = self.lock_carts();
        if carts.iter().any(|cart| cart.owner == *owner) {
            return Err(RepositoryError::Conflict(format!(
                "owner already has a cart: {owner}"
            )));
        }
        let now = Utc::now();
        let cart = Cart {
            id: CartId::new(self.next_cart_id.fetch_add(1, Ordering::Relaxed) + 1),
            owner: *owner,
            created_at: now,
            updated_at: now,
        };
        carts.push(cart.clone());
        Ok(cart)
    }

    async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        let mut carts = self.lock_carts();
        let before = carts.len();
        carts.retain(|cart| cart.id != id);
        if carts.len() == before {
            return Err(RepositoryError::NotFound);
        }
        self.lock_items().retain(|item| item.cart_id != id);
        Ok(())
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .lock_items()
            .iter()
            .filter(|item| item.cart_id == cart_id)
            .cloned()
            .collect())
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        Ok(self
            .lock_items()
            .iter()
            .find(|item| item.id == id)
            .cloned())
    }

    async fn insert_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let mut items = self.lock_items();
        if items
            .iter()
            .any(|item| item.cart_id == cart_id && item.product_id == product_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "cart {cart_id} already has a line for product {product_id}"
            )));
        }
        let now = Utc::now();
        let item = CartItem {
            id: CartItemId::new(self.next_item_id.fetch_add(1, Ordering::Relaxed) + 1),
            cart_id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn set_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let mut items = self.lock_items();
        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let mut items = self.lock_items();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_items(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        self.lock_items().retain(|item| item.cart_id != cart_id);
        Ok(())
    }
}
