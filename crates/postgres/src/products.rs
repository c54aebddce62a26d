//! Product repository backed by `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use verdant_commerce::models::product::{NewProduct, Product};
use verdant_commerce::repository::{ProductRepository, RepositoryError, StockDecrement};
use verdant_core::{Price, ProductId};

use crate::map_sqlx_error;

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    sku: String,
    price: Price,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            sku: row.sku,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL`-backed product catalog access.
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, sku, price, stock, created_at, updated_at
             FROM products
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.map(Product::from))
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, description, sku, price, stock, created_at, updated_at
             FROM products
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (name, description, sku, price, stock)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, description, sku, price, stock, created_at, updated_at",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        // Single conditional statement: the row lock makes the condition
        // re-evaluate against the newest committed stock.
        let remaining = sqlx::query_scalar::<_, i32>(
            "UPDATE products
             SET stock = stock - $2, updated_at = now()
             WHERE id = $1 AND stock >= $2
             RETURNING stock",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(remaining) = remaining {
            return Ok(StockDecrement::Applied { remaining });
        }

        // The update did not apply; report why. This read is only for the
        // error payload - the update above stays the linearization point.
        let available = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(available.map_or(StockDecrement::NotFound, |available| {
            StockDecrement::Insufficient { available }
        }))
    }

    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE products
             SET stock = stock + $2, updated_at = now()
             WHERE id = $1
             RETURNING stock",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepositoryError::NotFound)
    }
}
