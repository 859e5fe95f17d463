//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{PgStoreRepository, ShopifySessionRepository, StoreRepository, TokenRepository};
use crate::services::SettingsSynchronizer;
use crate::shopify::{AdminClient, AdminShopifyError, ThemeSource};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    shopify: AdminClient,
    store: Arc<dyn StoreRepository>,
    tokens: Arc<dyn TokenRepository>,
    themes: Arc<dyn ThemeSource>,
}

/// Backends the handlers read and write through.
pub struct Repositories {
    pub store: Arc<dyn StoreRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub themes: Arc<dyn ThemeSource>,
}

impl AppState {
    /// Create a new application state backed by `pool` and the Admin API.
    ///
    /// # Errors
    ///
    /// Returns an error if the Admin API HTTP client cannot be built.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, AdminShopifyError> {
        let shopify = AdminClient::new(&config.shopify)?;
        let repositories = Repositories {
            store: Arc::new(PgStoreRepository::new(pool.clone())),
            tokens: Arc::new(ShopifySessionRepository::new(pool.clone())),
            themes: Arc::new(shopify.clone()),
        };

        Ok(Self::from_parts(config, pool, shopify, repositories))
    }

    /// Create a state with explicit backends. `pool` still serves browser
    /// sessions and the readiness check.
    ///
    /// # Errors
    ///
    /// Returns an error if the Admin API HTTP client cannot be built.
    pub fn with_repositories(
        config: AppConfig,
        pool: PgPool,
        repositories: Repositories,
    ) -> Result<Self, AdminShopifyError> {
        let shopify = AdminClient::new(&config.shopify)?;
        Ok(Self::from_parts(config, pool, shopify, repositories))
    }

    fn from_parts(
        config: AppConfig,
        pool: PgPool,
        shopify: AdminClient,
        repositories: Repositories,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                store: repositories.store,
                tokens: repositories.tokens,
                themes: repositories.themes,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn store(&self) -> &dyn StoreRepository {
        self.inner.store.as_ref()
    }

    /// Offline token storage.
    #[must_use]
    pub fn tokens(&self) -> &dyn TokenRepository {
        self.inner.tokens.as_ref()
    }

    /// Settings operations over the configured store and theme source.
    #[must_use]
    pub fn settings(&self) -> SettingsSynchronizer<'_> {
        SettingsSynchronizer::new(
            self.inner.store.as_ref(),
            self.inner.themes.as_ref(),
            &self.inner.config.embed_marker,
        )
    }
}
