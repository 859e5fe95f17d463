//! In-memory repositories for tests and local tooling.

use std::collections::HashMap;

use async_trait::async_trait;
use clarity_pixel_core::{ShopDomain, StoreRecord};
use tokio::sync::RwLock;

use super::{RepositoryError, StoreRepository, TokenRepository};
use crate::shopify::OAuthToken;

/// [`StoreRepository`] backed by a map. Same replace-on-upsert semantics as
/// the `PostgreSQL` repository.
#[derive(Debug, Default)]
pub struct InMemoryStoreRepository {
    records: RwLock<HashMap<ShopDomain, StoreRecord>>,
}

impl InMemoryStoreRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record.
    pub async fn insert(&self, record: StoreRecord) {
        self.records
            .write()
            .await
            .insert(record.shop.clone(), record);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StoreRepository for InMemoryStoreRepository {
    async fn find(&self, shop: &ShopDomain) -> Result<Option<StoreRecord>, RepositoryError> {
        Ok(self.records.read().await.get(shop).cloned())
    }

    async fn upsert(&self, record: &StoreRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .insert(record.shop.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        Ok(self.records.write().await.remove(shop).is_some())
    }
}

/// [`TokenRepository`] backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<ShopDomain, OAuthToken>>,
}

impl InMemoryTokenRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn get_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<OAuthToken>, RepositoryError> {
        Ok(self.tokens.read().await.get(shop).cloned())
    }

    async fn save(&self, token: &OAuthToken) -> Result<(), RepositoryError> {
        self.tokens
            .write()
            .await
            .insert(token.shop.clone(), token.clone());
        Ok(())
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        Ok(self.tokens.write().await.remove(shop).is_some())
    }
}
