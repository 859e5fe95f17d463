//! Load and save a shop's Clarity settings.
//!
//! Loading reads the stored record and, concurrently, checks the shop's main
//! theme for the app embed. Theme problems never fail a load; they are logged
//! and reported as "embed absent". Saving replaces the stored record.

use clarity_pixel_core::{SettingsSubmission, StoreDetails, StoreRecord, TrackingId};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::db::{RepositoryError, StoreRepository};
use crate::shopify::{ShopContext, ThemeSource};

use super::embed;

/// Errors from loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load store settings: {0}")]
    PersistenceRead(#[source] RepositoryError),
    #[error("failed to save store settings: {0}")]
    PersistenceWrite(#[source] RepositoryError),
}

/// What the settings page renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    #[serde(rename = "clarityId")]
    pub tracking_id: Option<TrackingId>,
    pub details: StoreDetails,
    pub embed_present: bool,
}

/// Settings operations for one request.
pub struct SettingsSynchronizer<'a> {
    store: &'a dyn StoreRepository,
    themes: &'a dyn ThemeSource,
    embed_marker: &'a str,
}

impl<'a> SettingsSynchronizer<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn StoreRepository,
        themes: &'a dyn ThemeSource,
        embed_marker: &'a str,
    ) -> Self {
        Self {
            store,
            themes,
            embed_marker,
        }
    }

    /// Load the shop's settings and embed status.
    ///
    /// A shop that never saved gets no tracking ID and details derived from
    /// `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::PersistenceRead` if the record cannot be read.
    #[instrument(skip(self, ctx), fields(shop = %ctx.shop))]
    pub async fn load(&self, ctx: &ShopContext) -> Result<SettingsView, SettingsError> {
        let (record, embed_present) = tokio::join!(self.record(ctx), self.embed_present(ctx));

        let (tracking_id, details) = match record? {
            Some(record) => (record.tracking_id, record.details.without_secrets()),
            None => (
                None,
                StoreDetails::for_shop(ctx.shop.clone(), ctx.scope.clone()),
            ),
        };

        Ok(SettingsView {
            tracking_id,
            details,
            embed_present,
        })
    }

    /// The stored record only, without the theme check.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::PersistenceRead` if the record cannot be read.
    pub async fn record(&self, ctx: &ShopContext) -> Result<Option<StoreRecord>, SettingsError> {
        self.store
            .find(&ctx.shop)
            .await
            .map_err(SettingsError::PersistenceRead)
    }

    /// Replace the shop's stored settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::PersistenceWrite` if the upsert fails.
    #[instrument(skip(self, ctx, submission), fields(shop = %ctx.shop))]
    pub async fn save(
        &self,
        ctx: &ShopContext,
        submission: SettingsSubmission,
    ) -> Result<StoreRecord, SettingsError> {
        let record = StoreRecord::new(
            ctx.shop.clone(),
            submission.tracking_id,
            submission.details,
        );

        self.store
            .upsert(&record)
            .await
            .map_err(SettingsError::PersistenceWrite)?;

        info!(
            has_tracking_id = record.tracking_id.is_some(),
            "Saved store settings"
        );
        Ok(record)
    }

    async fn embed_present(&self, ctx: &ShopContext) -> bool {
        let theme = match self.themes.main_theme(ctx).await {
            Ok(Some(theme)) => theme,
            Ok(None) => {
                debug!("Shop has no main theme");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch main theme, assuming embed absent");
                return false;
            }
        };

        let raw = match self.themes.settings_data(ctx, &theme).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, theme_id = %theme.id, "Failed to fetch theme settings, assuming embed absent");
                return false;
            }
        };

        embed::contains_embed(raw.as_deref(), self.embed_marker).unwrap_or_else(|e| {
            warn!(error = %e, theme_id = %theme.id, "Unparseable theme settings, assuming embed absent");
            false
        })
    }
}
