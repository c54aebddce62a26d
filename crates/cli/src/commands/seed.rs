//! Seed the catalog with sample products for local development.
//!
//! # Usage
//!
//! ```bash
//! verdant seed
//! ```
//!
//! Seeding is re-runnable: products whose SKU already exists are skipped.

use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

use verdant_commerce::models::product::NewProduct;
use verdant_commerce::repository::{ProductRepository, RepositoryError};
use verdant_core::Price;
use verdant_postgres::PgProductRepository;

/// Errors from the seed command.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A required environment variable is not set.
    #[error("{0} not set")]
    MissingEnvVar(&'static str),

    /// Connecting to the database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Inserting a product failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

fn sample_catalog() -> Vec<NewProduct> {
    let product = |name: &str, description: &str, sku: &str, cents: i64, stock: i32| NewProduct {
        name: name.to_owned(),
        description: description.to_owned(),
        sku: sku.to_owned(),
        price: Price::from_cents(cents),
        stock,
    };
    vec![
        product(
            "Monstera Deliciosa",
            "Split-leaf philodendron in a 6\" nursery pot.",
            "PLANT-MON-6",
            3499,
            24,
        ),
        product(
            "Snake Plant",
            "Sansevieria trifasciata, tolerates low light.",
            "PLANT-SNK-4",
            1899,
            40,
        ),
        product(
            "Ceramic Planter",
            "Matte white ceramic planter with drainage, 8\".",
            "POT-CER-8",
            2450,
            15,
        ),
        product(
            "Potting Mix",
            "Indoor potting mix, 4 qt bag.",
            "SOIL-MIX-4Q",
            899,
            60,
        ),
        product(
            "Brass Watering Can",
            "1 liter long-spout watering can.",
            "TOOL-WTR-1L",
            3200,
            8,
        ),
    ]
}

/// Insert the sample catalog, skipping SKUs that already exist.
///
/// # Errors
///
/// Returns [`SeedError`] if the environment variable is missing, the
/// connection fails, or an insert fails for a reason other than a
/// duplicate SKU.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| SeedError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = verdant_postgres::create_pool(&database_url).await?;
    let products = PgProductRepository::new(pool);

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for product in sample_catalog() {
        let sku = product.sku.clone();
        match products.insert(product).await {
            Ok(created) => {
                info!(sku = %sku, id = %created.id, "seeded product");
                inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(sku = %sku, "sku already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(inserted, skipped, "Seeding complete!");
    Ok(())
}
