//! Cart repository backed by `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use verdant_commerce::models::cart::{Cart, CartItem};
use verdant_commerce::repository::{CartRepository, RepositoryError};
use verdant_core::{CartId, CartItemId, OwnerKey, ProductId, SessionId, UserId};

use crate::map_sqlx_error;

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    session_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        // The schema CHECK guarantees exactly one owner column is set;
        // anything else is corrupted data, not a valid cart.
        let owner = match (row.user_id, row.session_id) {
            (Some(user_id), None) => OwnerKey::Account(user_id),
            (None, Some(session_id)) => OwnerKey::Session(SessionId::new(session_id)),
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "cart {} must have exactly one owner",
                    row.id
                )));
            }
        };
        Ok(Self {
            id: row.id,
            owner,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for cart item queries.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL`-backed cart storage.
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find_by_owner(&self, owner: &OwnerKey) -> Result<Option<Cart>, RepositoryError> {
        let row = match owner {
            OwnerKey::Account(user_id) => {
                sqlx::query_as::<_, CartRow>(
                    "SELECT id, user_id, session_id, created_at, updated_at
                     FROM carts
                     WHERE user_id = $1",
                )
                .bind(*user_id)
                .fetch_optional(&self.pool)
                .await
            }
            OwnerKey::Session(session_id) => {
                sqlx::query_as::<_, CartRow>(
                    "SELECT id, user_id, session_id, created_at, updated_at
                     FROM carts
                     WHERE session_id = $1",
                )
                .bind(session_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        row.map(Cart::try_from).transpose()
    }

    async fn create(&self, owner: &OwnerKey) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (user_id, session_id)
             VALUES ($1, $2)
             RETURNING id, user_id, session_id, created_at, updated_at",
        )
        .bind(owner.account_id())
        .bind(owner.session_id().map(|session_id| session_id.as_uuid()))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, quantity, created_at, updated_at
             FROM cart_items
             WHERE cart_id = $1
             ORDER BY id",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    async fn find_item(&self, id: CartItemId) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, cart_id, product_id, quantity, created_at, updated_at
             FROM cart_items
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(CartItem::from))
    }

    async fn insert_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             RETURNING id, cart_id, product_id, quantity, created_at, updated_at",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn set_item_quantity(
        &self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_items(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
