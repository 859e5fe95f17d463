//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! clarity-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `APP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/app/migrations/`:
//! ```text
//! migrations/
//! ├── 20260101000001_create_store.sql
//! ├── 20260101000002_create_shopify_session.sql
//! └── 20260101000003_create_tower_sessions.sql
//! ```

use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connection string from `APP_DATABASE_URL`, else `DATABASE_URL`.
pub fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    std::env::var("APP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

/// Run the app's migrations.
pub async fn run() -> Result<(), MigrationError> {
    let database_url =
        database_url().ok_or(MigrationError::MissingEnvVar("APP_DATABASE_URL"))?;

    tracing::info!("Connecting to app database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running app migrations...");
    sqlx::migrate!("../app/migrations").run(&pool).await?;

    tracing::info!("App migrations complete!");
    Ok(())
}
