//! `PostgreSQL` repository for per-shop settings.

use async_trait::async_trait;
use clarity_pixel_core::{ShopDomain, StoreDetails, StoreRecord, TrackingId};
use sqlx::PgPool;
use tracing::instrument;

use super::{RepositoryError, StoreRepository};

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: String,
    #[sqlx(rename = "clarityId")]
    clarity_id: Option<String>,
    details: serde_json::Value,
}

impl TryFrom<StoreRow> for StoreRecord {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop '{}': {e}", row.id))
        })?;
        let tracking_id = TrackingId::parse_optional(row.clarity_id.as_deref().unwrap_or(""))
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid clarityId for {shop}: {e}"))
            })?;
        let details = StoreDetails::from_json(row.details).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid details for {shop}: {e}"))
        })?;

        Ok(Self::new(shop, tracking_id, details))
    }
}

/// Repository for the `store` table.
#[derive(Clone)]
pub struct PgStoreRepository {
    pool: PgPool,
}

impl PgStoreRepository {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRepository for PgStoreRepository {
    #[instrument(skip(self), fields(shop = %shop))]
    async fn find(&self, shop: &ShopDomain) -> Result<Option<StoreRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, "clarityId", details
            FROM store
            WHERE id = $1
            "#,
        )
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoreRecord::try_from).transpose()
    }

    #[instrument(skip(self, record), fields(shop = %record.shop))]
    async fn upsert(&self, record: &StoreRecord) -> Result<(), RepositoryError> {
        let details = record
            .details
            .to_json()
            .map_err(|e| RepositoryError::DataCorruption(format!("unencodable details: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO store (id, "clarityId", details)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                "clarityId" = EXCLUDED."clarityId",
                details = EXCLUDED.details,
                updated_at = NOW()
            "#,
        )
        .bind(record.shop.as_str())
        .bind(record.tracking_id.as_ref().map(TrackingId::as_str))
        .bind(details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(shop = %shop))]
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM store WHERE id = $1")
            .bind(shop.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(id: &str, clarity_id: Option<&str>, details: serde_json::Value) -> StoreRow {
        StoreRow {
            id: id.to_string(),
            clarity_id: clarity_id.map(String::from),
            details,
        }
    }

    #[test]
    fn test_row_conversion() {
        let record = StoreRecord::try_from(row(
            "demo.myshopify.com",
            Some("k2x9abc1de"),
            json!({"appInstalled": true}),
        ))
        .unwrap();

        assert_eq!(record.shop.as_str(), "demo.myshopify.com");
        assert_eq!(record.tracking_id.unwrap().as_str(), "k2x9abc1de");
        assert!(record.details.app_installed());
    }

    #[test]
    fn test_blank_clarity_id_reads_as_unset() {
        let record =
            StoreRecord::try_from(row("demo.myshopify.com", Some(""), json!({}))).unwrap();
        assert!(record.tracking_id.is_none());
    }

    #[test]
    fn test_corrupt_rows() {
        assert!(matches!(
            StoreRecord::try_from(row("not-a-shop", None, json!({}))),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            StoreRecord::try_from(row("demo.myshopify.com", Some("bad id"), json!({}))),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            StoreRecord::try_from(row("demo.myshopify.com", None, json!("details"))),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
