//! Store settings commands.
//!
//! Operates on the same `store` table and validation rules as the embedded
//! settings page, for support and local testing.
//!
//! # Usage
//!
//! ```bash
//! clarity-cli store show --shop demo.myshopify.com
//! clarity-cli store set --shop demo.myshopify.com --tracking-id k2x9abc1de
//! clarity-cli store set --shop demo.myshopify.com --clear
//! clarity-cli store toggle --shop demo.myshopify.com --event search
//! ```

use clarity_pixel_app::db::{PgStoreRepository, RepositoryError, StoreRepository};
use clarity_pixel_core::{
    SettingsForm, ShopDomain, ShopDomainError, StoreDetails, StoreRecord, TrackedEvent,
    TrackingId, TrackingIdError, UnknownEventError,
};
use sqlx::PgPool;
use thiserror::Error;

use super::migrate::database_url;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Invalid shop: {0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Invalid Clarity ID: {0}")]
    InvalidTrackingId(#[from] TrackingIdError),

    #[error("{0}. Valid events: viewCategory, viewItem, search, addToCart, beginCheckout, purchase")]
    UnknownEvent(#[from] UnknownEventError),

    #[error("No settings saved for {0}")]
    NotFound(ShopDomain),

    #[error("Failed to encode details: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Which change `set` applies to the tracking ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingIdChange {
    Keep,
    Clear,
    Replace(String),
}

impl TrackingIdChange {
    /// Interpret the `--tracking-id` and `--clear` flags.
    #[must_use]
    pub fn from_flags(tracking_id: Option<String>, clear: bool) -> Self {
        match (tracking_id, clear) {
            (_, true) => Self::Clear,
            (Some(id), false) => Self::Replace(id),
            (None, false) => Self::Keep,
        }
    }
}

async fn connect() -> Result<PgPool, StoreError> {
    let url = database_url().ok_or(StoreError::MissingEnvVar("APP_DATABASE_URL"))?;
    tracing::info!("Connecting to app database...");
    Ok(PgPool::connect(&url).await?)
}

/// Stored record for `shop`, or a fresh one if it never saved.
async fn current(
    repo: &dyn StoreRepository,
    shop: &ShopDomain,
) -> Result<StoreRecord, StoreError> {
    Ok(repo.find(shop).await?.unwrap_or_else(|| {
        StoreRecord::new(shop.clone(), None, StoreDetails::for_shop(shop.clone(), None))
    }))
}

/// Print the stored settings for `shop`.
pub async fn show(shop: &str) -> Result<(), StoreError> {
    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;
    let record = PgStoreRepository::new(pool)
        .find(&shop)
        .await?
        .ok_or(StoreError::NotFound(shop))?;

    let details = serde_json::to_string_pretty(&record.details.clone().without_secrets())?;
    let events: Vec<&str> = record.details.events().tracked().map(TrackedEvent::key).collect();

    #[allow(clippy::print_stdout)]
    {
        println!("shop:      {}", record.shop);
        println!(
            "clarityId: {}",
            record.tracking_id.as_ref().map_or("(not set)", TrackingId::as_str)
        );
        println!("events:    {}", events.join(", "));
        println!("details:   {details}");
    }

    Ok(())
}

/// Apply `change` to `record` using the settings form rules.
///
/// # Errors
///
/// Returns `TrackingIdError` if the replacement ID is invalid.
pub fn apply_tracking_id(
    record: StoreRecord,
    change: TrackingIdChange,
) -> Result<StoreRecord, TrackingIdError> {
    let mut form = SettingsForm::new(record.tracking_id.as_ref(), record.details);
    match change {
        TrackingIdChange::Keep => {}
        TrackingIdChange::Clear => form.set_tracking_id(""),
        TrackingIdChange::Replace(id) => form.set_tracking_id(id),
    }

    let submission = form.submission()?;
    Ok(StoreRecord::new(
        record.shop,
        submission.tracking_id,
        submission.details,
    ))
}

/// Flip `event` on `record`. Returns the updated record and the event's new flag.
///
/// # Errors
///
/// Returns `TrackingIdError` if the stored ID no longer validates.
pub fn apply_toggle(
    record: StoreRecord,
    event: TrackedEvent,
) -> Result<(StoreRecord, bool), TrackingIdError> {
    let mut form = SettingsForm::new(record.tracking_id.as_ref(), record.details);
    let tracked = form.toggle_event(event);

    let submission = form.submission()?;
    Ok((
        StoreRecord::new(record.shop, submission.tracking_id, submission.details),
        tracked,
    ))
}

/// Set or clear the tracking ID for `shop`.
pub async fn set(shop: &str, change: TrackingIdChange) -> Result<(), StoreError> {
    let shop = ShopDomain::parse(shop)?;
    let pool = connect().await?;
    let repo = PgStoreRepository::new(pool);

    let record = apply_tracking_id(current(&repo, &shop).await?, change)?;
    repo.upsert(&record).await?;

    tracing::info!(
        shop = %record.shop,
        clarity_id = record.tracking_id.as_ref().map_or("", TrackingId::as_str),
        "Store settings saved"
    );
    Ok(())
}

/// Toggle one tracked event for `shop`.
pub async fn toggle(shop: &str, event: &str) -> Result<(), StoreError> {
    let shop = ShopDomain::parse(shop)?;
    let event: TrackedEvent = event.parse()?;
    let pool = connect().await?;
    let repo = PgStoreRepository::new(pool);

    let (record, tracked) = apply_toggle(current(&repo, &shop).await?, event)?;
    repo.upsert(&record).await?;

    tracing::info!(shop = %record.shop, event = %event, tracked, "Event selection saved");
    Ok(())
}
