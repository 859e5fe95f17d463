//! Trackable storefront events and the merchant's selection of them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when an event key is not one of the known events.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event: {0}")]
pub struct UnknownEventError(pub String);

/// A storefront event the merchant can choose to track.
///
/// The set is closed. Keys are the camelCase names stored in
/// `details.selectedEvents`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackedEvent {
    ViewCategory,
    ViewItem,
    Search,
    AddToCart,
    BeginCheckout,
    Purchase,
}

impl TrackedEvent {
    /// Every event, in display order.
    pub const ALL: [Self; 6] = [
        Self::ViewCategory,
        Self::ViewItem,
        Self::Search,
        Self::AddToCart,
        Self::BeginCheckout,
        Self::Purchase,
    ];

    /// Stable camelCase key used in persisted details.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ViewCategory => "viewCategory",
            Self::ViewItem => "viewItem",
            Self::Search => "search",
            Self::AddToCart => "addToCart",
            Self::BeginCheckout => "beginCheckout",
            Self::Purchase => "purchase",
        }
    }

    /// Human-readable checkbox label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ViewCategory => "View Category",
            Self::ViewItem => "View Item",
            Self::Search => "Search",
            Self::AddToCart => "Add to Cart",
            Self::BeginCheckout => "Begin Checkout",
            Self::Purchase => "Purchase",
        }
    }

    /// Shopify standard customer event this maps to in a web pixel.
    #[must_use]
    pub const fn shopify_event(self) -> &'static str {
        match self {
            Self::ViewCategory => "collection_viewed",
            Self::ViewItem => "product_viewed",
            Self::Search => "search_submitted",
            Self::AddToCart => "product_added_to_cart",
            Self::BeginCheckout => "checkout_started",
            Self::Purchase => "checkout_completed",
        }
    }
}

impl fmt::Display for TrackedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for TrackedEvent {
    type Err = UnknownEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.key() == s)
            .ok_or_else(|| UnknownEventError(s.to_string()))
    }
}

/// Which events are tracked.
///
/// Every event defaults to tracked; missing keys in a stored blob therefore
/// read back as `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventSelection {
    pub view_category: bool,
    pub view_item: bool,
    pub search: bool,
    pub add_to_cart: bool,
    pub begin_checkout: bool,
    pub purchase: bool,
}

impl Default for EventSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl EventSelection {
    /// Every event tracked.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            view_category: true,
            view_item: true,
            search: true,
            add_to_cart: true,
            begin_checkout: true,
            purchase: true,
        }
    }

    /// No event tracked.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            view_category: false,
            view_item: false,
            search: false,
            add_to_cart: false,
            begin_checkout: false,
            purchase: false,
        }
    }

    /// Whether `event` is tracked.
    #[must_use]
    pub const fn is_tracked(&self, event: TrackedEvent) -> bool {
        match event {
            TrackedEvent::ViewCategory => self.view_category,
            TrackedEvent::ViewItem => self.view_item,
            TrackedEvent::Search => self.search,
            TrackedEvent::AddToCart => self.add_to_cart,
            TrackedEvent::BeginCheckout => self.begin_checkout,
            TrackedEvent::Purchase => self.purchase,
        }
    }

    /// Set the flag for `event`.
    pub const fn set(&mut self, event: TrackedEvent, tracked: bool) {
        let flag = match event {
            TrackedEvent::ViewCategory => &mut self.view_category,
            TrackedEvent::ViewItem => &mut self.view_item,
            TrackedEvent::Search => &mut self.search,
            TrackedEvent::AddToCart => &mut self.add_to_cart,
            TrackedEvent::BeginCheckout => &mut self.begin_checkout,
            TrackedEvent::Purchase => &mut self.purchase,
        };
        *flag = tracked;
    }

    /// Flip the flag for `event` and return its new value.
    pub const fn toggle(&mut self, event: TrackedEvent) -> bool {
        let tracked = !self.is_tracked(event);
        self.set(event, tracked);
        tracked
    }

    /// Iterate over every event with its flag, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (TrackedEvent, bool)> + '_ {
        TrackedEvent::ALL
            .into_iter()
            .map(move |event| (event, self.is_tracked(event)))
    }

    /// Iterate over the tracked events only.
    pub fn tracked(&self) -> impl Iterator<Item = TrackedEvent> + '_ {
        self.iter()
            .filter_map(|(event, tracked)| tracked.then_some(event))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tracks_everything() {
        let selection = EventSelection::default();
        assert_eq!(selection.tracked().count(), TrackedEvent::ALL.len());
    }

    #[test]
    fn test_toggle_is_an_involution() {
        for event in TrackedEvent::ALL {
            let original = EventSelection::default();
            let mut selection = original;

            assert!(!selection.toggle(event));
            assert_ne!(selection, original);
            assert!(selection.toggle(event));
            assert_eq!(selection, original);
        }
    }

    #[test]
    fn test_toggle_only_touches_one_flag() {
        let mut selection = EventSelection::default();
        selection.toggle(TrackedEvent::Search);

        let untracked: Vec<_> = selection.iter().filter(|(_, t)| !t).collect();
        assert_eq!(untracked, vec![(TrackedEvent::Search, false)]);
    }

    #[test]
    fn test_serializes_camel_case_keys() {
        let mut selection = EventSelection::none();
        selection.set(TrackedEvent::AddToCart, true);

        let json = serde_json::to_value(selection).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "viewCategory": false,
                "viewItem": false,
                "search": false,
                "addToCart": true,
                "beginCheckout": false,
                "purchase": false,
            })
        );
    }

    #[test]
    fn test_missing_keys_default_to_tracked() {
        let selection: EventSelection =
            serde_json::from_str(r#"{"purchase": false}"#).unwrap();
        assert!(!selection.purchase);
        assert!(selection.view_item);
        assert!(selection.begin_checkout);
    }

    #[test]
    fn test_event_key_parsing() {
        for event in TrackedEvent::ALL {
            assert_eq!(event.key().parse::<TrackedEvent>().unwrap(), event);
        }
        assert!("checkout".parse::<TrackedEvent>().is_err());
    }

    #[test]
    fn test_shopify_event_names() {
        assert_eq!(
            TrackedEvent::Purchase.shopify_event(),
            "checkout_completed"
        );
        assert_eq!(
            TrackedEvent::ViewCategory.shopify_event(),
            "collection_viewed"
        );
    }
}
