//! `PostgreSQL` persistence backend for Verdant Commerce.
//!
//! # Schema
//!
//! One database, one schema, five tables (see `migrations/`):
//!
//! - `products` - catalog rows read by the engine; `stock` carries a
//!   `CHECK (stock >= 0)` as a second line of defense behind the
//!   conditional decrement
//! - `carts` - exactly one of `user_id` / `session_id` is non-null,
//!   enforced by a CHECK constraint
//! - `cart_items` - unique per `(cart_id, product_id)`
//! - `orders`, `order_items` - immutable history once created
//!
//! # Stock integrity
//!
//! [`PgProductRepository`] implements the reserve primitive as a single
//! conditional statement:
//!
//! ```sql
//! UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2
//! ```
//!
//! `PostgreSQL` row-locks the product for the duration of the statement, so
//! concurrent reservations serialize and the condition is re-evaluated
//! against the newest committed stock - never a read-then-write pair.
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/postgres/migrations/` and run via:
//! ```bash
//! cargo run -p verdant-cli -- migrate
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use verdant_commerce::repository::RepositoryError;

pub mod carts;
pub mod orders;
pub mod products;

pub use carts::PgCartRepository;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;

/// Embedded migrations for the commerce schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a sqlx error onto the engine's repository error.
///
/// Unique/check violations become `Conflict`; a missing row on a statement
/// that requires one becomes `NotFound`; everything else is a `Storage`
/// failure.
fn map_sqlx_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
            RepositoryError::Conflict(db.message().to_owned())
        }
        other => RepositoryError::Storage(other.to_string()),
    }
}
