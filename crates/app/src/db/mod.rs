//! Database operations for the app's `PostgreSQL`.
//!
//! ## Tables
//!
//! - `store` - Per-shop Clarity ID and details blob
//! - `shopify_session` - Offline Admin API tokens
//! - `tower_sessions.session` - Browser session storage (OAuth state)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/app/migrations/` and run via:
//! ```bash
//! cargo run -p clarity-pixel-cli -- migrate
//! ```

pub mod memory;
pub mod shopify;
pub mod store;

use std::time::Duration;

use async_trait::async_trait;
use clarity_pixel_core::{ShopDomain, StoreRecord};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::shopify::OAuthToken;

pub use memory::{InMemoryStoreRepository, InMemoryTokenRepository};
pub use shopify::ShopifySessionRepository;
pub use store::PgStoreRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Persistence of per-shop settings.
///
/// Implemented by [`PgStoreRepository`] and, for tests and local tooling,
/// [`InMemoryStoreRepository`].
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Fetch the record for `shop`, if one was ever saved.
    async fn find(&self, shop: &ShopDomain) -> Result<Option<StoreRecord>, RepositoryError>;

    /// Insert or wholesale replace the record keyed by `record.shop`.
    async fn upsert(&self, record: &StoreRecord) -> Result<(), RepositoryError>;

    /// Remove the record for `shop`. Returns whether a record existed.
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError>;
}

/// Persistence of offline Admin API tokens, one per installed shop.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn get_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<OAuthToken>, RepositoryError>;

    /// Save or replace the token for `token.shop`.
    async fn save(&self, token: &OAuthToken) -> Result<(), RepositoryError>;

    /// Returns whether a token existed.
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
