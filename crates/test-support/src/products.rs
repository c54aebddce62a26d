//! In-memory product repositories.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use verdant_commerce::models::product::{NewProduct, Product};
use verdant_commerce::repository::{ProductRepository, RepositoryError, StockDecrement};
use verdant_core::ProductId;

/// An in-memory product catalog.
///
/// `try_decrement_stock` performs the compare and the write under a single
/// lock, so concurrent reservations against the same product serialize the
/// same way the production conditional update does.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: Mutex<HashMap<ProductId, Product>>,
    next_id: AtomicI32,
}

impl InMemoryProductRepository {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a product's price, as the (out-of-engine) catalog admin
    /// would. Returns `false` if the product does not exist.
    pub fn set_price(&self, id: ProductId, price: verdant_core::Price) -> bool {
        let mut products = self.lock();
        products.get_mut(&id).is_some_and(|product| {
            product.price = price;
            product.updated_at = Utc::now();
            true
        })
    }

    /// Overwrite a product's stock level directly, bypassing the
    /// conditional decrement. Test setup only.
    pub fn set_stock(&self, id: ProductId, stock: i32) -> bool {
        let mut products = self.lock();
        products.get_mut(&id).is_some_and(|product| {
            product.stock = stock;
            product.updated_at = Utc::now();
            true
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ProductId, Product>> {
        self.products.lock().expect("product map lock poisoned")
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self.lock().values().cloned().collect();
        products.sort_by_key(|product| product.id);
        Ok(products)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut products = self.lock();
        if products.values().any(|existing| existing.sku == product.sku) {
            return Err(RepositoryError::Conflict(format!(
                "duplicate sku: {}",
                product.sku
            )));
        }
        let now = Utc::now();
        let stored = Product {
            id: ProductId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1),
            name: product.name,
            description: product.description,
            sku: product.sku,
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        products.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        let mut products = self.lock();
        let Some(product) = products.get_mut(&id) else {
            return Ok(StockDecrement::NotFound);
        };
        if product.stock < quantity {
            return Ok(StockDecrement::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(StockDecrement::Applied {
            remaining: product.stock,
        })
    }

    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        let mut products = self.lock();
        let product = products.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        product.stock += quantity;
        product.updated_at = Utc::now();
        Ok(product.stock)
    }
}

/// A product repository that always fails with a storage error. Useful for
/// testing error-propagation paths.
#[derive(Debug, Default)]
pub struct FailingProductRepository;

fn storage_error() -> RepositoryError {
    RepositoryError::Storage("simulated storage failure".to_owned())
}

#[async_trait]
impl ProductRepository for FailingProductRepository {
    async fn find(&self, _id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Err(storage_error())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        Err(storage_error())
    }

    async fn insert(&self, _product: NewProduct) -> Result<Product, RepositoryError> {
        Err(storage_error())
    }

    async fn try_decrement_stock(
        &self,
        _id: ProductId,
        _quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        Err(storage_error())
    }

    async fn increment_stock(
        &self,
        _id: ProductId,
        _quantity: i32,
    ) -> Result<i32, RepositoryError> {
        Err(storage_error())
    }
}

/// A product repository whose conditional decrements start failing after a
/// configured number of successes, while reads keep working.
///
/// This simulates the commit-pass race in order creation: the check pass
/// sees stock, then a "concurrent order" claims it before the reservation
/// lands.
#[derive(Debug)]
pub struct ContestedProductRepository {
    inner: InMemoryProductRepository,
    decrements_allowed: AtomicUsize,
}

impl ContestedProductRepository {
    /// Wrap `inner`, allowing `decrements_allowed` successful decrements
    /// before every further attempt reports insufficient stock.
    #[must_use]
    pub fn new(inner: InMemoryProductRepository, decrements_allowed: usize) -> Self {
        Self {
            inner,
            decrements_allowed: AtomicUsize::new(decrements_allowed),
        }
    }
}

#[async_trait]
impl ProductRepository for ContestedProductRepository {
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.inner.find(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list().await
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        self.inner.insert(product).await
    }

    async fn try_decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<StockDecrement, RepositoryError> {
        let allowed = self
            .decrements_allowed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if allowed {
            return self.inner.try_decrement_stock(id, quantity).await;
        }
        let available = self
            .inner
            .find(id)
            .await?
            .map_or(0, |product| product.stock);
        Ok(StockDecrement::Insufficient { available })
    }

    async fn increment_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<i32, RepositoryError> {
        self.inner.increment_stock(id, quantity).await
    }
}
