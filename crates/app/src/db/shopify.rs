//! Offline Shopify access token repository.
//!
//! One row per installed shop, written by the OAuth callback or by session
//! token exchange.

use async_trait::async_trait;
use clarity_pixel_core::ShopDomain;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tracing::instrument;

use super::{RepositoryError, TokenRepository};
use crate::shopify::OAuthToken;

/// Internal row type for `PostgreSQL` queries.
#[derive(sqlx::FromRow)]
struct ShopifySessionRow {
    shop: String,
    access_token: String,
    scope: String,
    obtained_at: i64,
}

impl TryFrom<ShopifySessionRow> for OAuthToken {
    type Error = RepositoryError;

    fn try_from(row: ShopifySessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop '{}': {e}", row.shop))
        })?;

        Ok(Self {
            shop,
            access_token: SecretString::from(row.access_token),
            scope: row.scope,
            obtained_at: row.obtained_at,
        })
    }
}

/// Repository for offline access tokens.
#[derive(Clone)]
pub struct ShopifySessionRepository {
    pool: PgPool,
}

impl ShopifySessionRepository {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for ShopifySessionRepository {
    #[instrument(skip(self), fields(shop = %shop))]
    async fn get_by_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Option<OAuthToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopifySessionRow>(
            r"
            SELECT shop, access_token, scope, obtained_at
            FROM shopify_session
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(OAuthToken::try_from).transpose()
    }

    #[instrument(skip(self, token), fields(shop = %token.shop))]
    async fn save(&self, token: &OAuthToken) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shopify_session (shop, access_token, scope, obtained_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                obtained_at = EXCLUDED.obtained_at,
                updated_at = NOW()
            ",
        )
        .bind(token.shop.as_str())
        .bind(token.access_token.expose_secret())
        .bind(&token.scope)
        .bind(token.obtained_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shopify_session WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
