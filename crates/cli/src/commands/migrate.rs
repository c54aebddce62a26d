//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! verdant migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use secrecy::SecretString;
use thiserror::Error;

/// Errors from the migrate command.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required environment variable is not set.
    #[error("{0} not set")]
    MissingEnvVar(&'static str),

    /// Connecting to the database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Run the embedded migrations against `DATABASE_URL`.
///
/// # Errors
///
/// Returns [`MigrateError`] if the environment variable is missing, the
/// connection fails, or a migration fails to apply.
pub async fn run() -> Result<(), MigrateError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MigrateError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = verdant_postgres::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    verdant_postgres::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
