//! Core types for the Clarity Pixel app.
//!
//! Validated wrappers for tenant identifiers and tracking IDs, plus the
//! typed settings record persisted per shop.

pub mod details;
pub mod events;
pub mod shop;
pub mod store;
pub mod tracking_id;

pub use details::StoreDetails;
pub use events::{EventSelection, TrackedEvent, UnknownEventError};
pub use shop::{ShopDomain, ShopDomainError};
pub use store::StoreRecord;
pub use tracking_id::{TrackingId, TrackingIdError};
