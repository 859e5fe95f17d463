//! The persisted per-shop settings record.

use serde::{Deserialize, Serialize};

use super::details::StoreDetails;
use super::shop::ShopDomain;
use super::tracking_id::TrackingId;

/// One row of the `store` table.
///
/// Keyed by shop; saving replaces the row wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub shop: ShopDomain,
    #[serde(rename = "clarityId")]
    pub tracking_id: Option<TrackingId>,
    pub details: StoreDetails,
}

impl StoreRecord {
    /// Build a record for `shop`.
    #[must_use]
    pub const fn new(
        shop: ShopDomain,
        tracking_id: Option<TrackingId>,
        details: StoreDetails,
    ) -> Self {
        Self {
            shop,
            tracking_id,
            details,
        }
    }
}
