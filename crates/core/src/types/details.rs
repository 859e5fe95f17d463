//! Per-store details blob.
//!
//! Persisted as JSON in the `store.details` column. Known keys are typed;
//! anything else found in an existing blob is kept in [`StoreDetails::extra`]
//! so it survives a load/save cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::events::EventSelection;
use super::shop::ShopDomain;

/// Keys that must never be echoed back to the browser.
///
/// Older records stored the whole host session object, access token included.
const SECRET_KEYS: &[&str] = &["accessToken", "onlineAccessInfo"];

/// Store-level details saved alongside the tracking ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetails {
    /// Shop the details were captured for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopDomain>,
    /// Access scopes granted at install time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Merchant confirmed the app embed is enabled in their theme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_installed: Option<bool>,
    /// Events the merchant wants tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_events: Option<EventSelection>,
    /// Unrecognized keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoreDetails {
    /// Details for a shop that has never saved anything.
    #[must_use]
    pub fn for_shop(shop: ShopDomain, scope: Option<String>) -> Self {
        Self {
            shop: Some(shop),
            scope,
            ..Self::default()
        }
    }

    /// Effective event selection (all events when never chosen).
    #[must_use]
    pub fn events(&self) -> EventSelection {
        self.selected_events.unwrap_or_default()
    }

    /// Whether the merchant confirmed the embed.
    #[must_use]
    pub fn app_installed(&self) -> bool {
        self.app_installed.unwrap_or(false)
    }

    /// Drop keys that carry credentials.
    #[must_use]
    pub fn without_secrets(mut self) -> Self {
        for key in SECRET_KEYS {
            self.extra.remove(*key);
        }
        self
    }

    /// Decode a persisted JSON value.
    ///
    /// `null` decodes to the default details.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the blob does not match the typed fields.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Encode for persistence.
    ///
    /// # Errors
    ///
    /// Returns the serde error if a preserved extra value cannot be encoded.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
