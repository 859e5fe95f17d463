//! Clarity Pixel Core - Shared types and pure logic.
//!
//! This crate provides what both the embedded app and the CLI need:
//! - validated identifiers ([`ShopDomain`], [`TrackingId`])
//! - the persisted settings record ([`StoreRecord`], [`StoreDetails`])
//! - event selection and form state ([`EventSelection`], [`SettingsForm`])
//! - the custom pixel code generator ([`snippet`])
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod form;
pub mod snippet;
pub mod types;

pub use form::{SettingsForm, SettingsSubmission};
pub use types::*;
