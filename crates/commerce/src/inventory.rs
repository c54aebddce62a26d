//! Inventory ledger: per-product stock with atomic reserve and release.
//!
//! Cart mutations only *check* availability (advisory - carts never consume
//! stock). Order creation *reserves* stock, and compensation or
//! cancellation *releases* it. Reservation delegates to the repository's
//! conditional decrement, so two concurrent reservations against the last
//! unit can never both succeed.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use verdant_core::ProductId;

use crate::repository::{ProductRepository, RepositoryError, StockDecrement};

/// Errors from inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product does not exist in the catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Not enough stock to satisfy the request. Nothing was changed.
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

    /// The backing store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Stock bookkeeping over a [`ProductRepository`].
#[derive(Clone)]
pub struct InventoryLedger {
    products: Arc<dyn ProductRepository>,
}

impl InventoryLedger {
    /// Create a ledger over the given product repository.
    #[must_use]
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    /// Check that `quantity` units of a product are currently available.
    ///
    /// Advisory only: the answer can be stale by the time the caller acts
    /// on it, which is why order creation re-validates via [`reserve`].
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for an unknown product and
    /// `InsufficientStock` when fewer than `quantity` units remain.
    ///
    /// [`reserve`]: Self::reserve
    pub async fn check_availability(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), InventoryError> {
        let product = self
            .products
            .find(product_id)
            .await?
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        if product.stock < quantity {
            return Err(InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }
        Ok(())
    }

    /// Atomically decrement stock by `quantity`, failing if that would
    /// drive it negative.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for an unknown product and
    /// `InsufficientStock` when the conditional decrement does not apply;
    /// in both cases stock is untouched.
    pub async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), InventoryError> {
        match self
            .products
            .try_decrement_stock(product_id, quantity)
            .await?
        {
            StockDecrement::Applied { remaining } => {
                debug!(product_id = %product_id, quantity, remaining, "reserved stock");
                Ok(())
            }
            StockDecrement::Insufficient { available } => Err(InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            }),
            StockDecrement::NotFound => Err(InventoryError::ProductNotFound(product_id)),
        }
    }

    /// Atomically return `quantity` units to stock.
    ///
    /// Used to compensate a failed multi-item reservation pass and to
    /// restock on order cancellation.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` for an unknown product.
    pub async fn release(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), InventoryError> {
        match self.products.increment_stock(product_id, quantity).await {
            Ok(level) => {
                debug!(product_id = %product_id, quantity, level, "released stock");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(InventoryError::ProductNotFound(product_id)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use verdant_core::Price;
    use verdant_test_support::InMemoryProductRepository;

    use super::*;
    use crate::models::product::NewProduct;

    async fn ledger_with_product(stock: i32) -> (InventoryLedger, ProductId) {
        let repo = Arc::new(InMemoryProductRepository::new());
        let product = repo
            .insert(NewProduct {
                name: "Widget".to_owned(),
                description: "A widget".to_owned(),
                sku: "WID-1".to_owned(),
                price: Price::from_cents(1000),
                stock,
            })
            .await
            .expect("insert product");
        (InventoryLedger::new(repo), product.id)
    }

    #[tokio::test]
    async fn test_check_availability_within_stock() {
        let (ledger, id) = ledger_with_product(5).await;
        assert!(ledger.check_availability(id, 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_availability_reports_have_and_want() {
        let (ledger, id) = ledger_with_product(5).await;
        let err = ledger.check_availability(id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                requested: 6,
                available: 5,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_check_availability_unknown_product() {
        let (ledger, _) = ledger_with_product(5).await;
        let err = ledger
            .check_availability(ProductId::new(999), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_reserve_then_release_restores_level() {
        let (ledger, id) = ledger_with_product(5).await;
        ledger.reserve(id, 3).await.expect("reserve");
        let err = ledger.check_availability(id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock { available: 2, .. }
        ));
        ledger.release(id, 3).await.expect("release");
        assert!(ledger.check_availability(id, 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_reserve_beyond_stock_changes_nothing() {
        let (ledger, id) = ledger_with_product(2).await;
        let err = ledger.reserve(id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
        assert!(ledger.check_availability(id, 2).await.is_ok());
    }

    #[tokio::test]
    async fn test_release_unknown_product() {
        let (ledger, _) = ledger_with_product(1).await;
        let err = ledger.release(ProductId::new(999), 1).await.unwrap_err();
        assert!(matches!(err, InventoryError::ProductNotFound(_)));
    }
}
